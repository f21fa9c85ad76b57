//! Refresh endpoint call
//!
//! POSTs the stored refresh token to `/auth/refresh` and parses the
//! response envelope. This function only reports what the endpoint said;
//! downgrading refresh failures to a cleared credential pair is the
//! coordinator's job.

use serde::Deserialize;

use crate::credentials::SessionTokens;
use crate::error::{Error, Result};

/// Path of the refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Envelope shape of the refresh response:
/// `{"success": true, "data": {"accessToken": ..., "refreshToken": ...}}`.
#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<SessionTokens>,
}

/// Exchange a refresh token for a new credential pair.
///
/// Any non-2xx status, unparsable body, or envelope missing either token
/// is an error. 401/403 are reported as `InvalidCredentials` so callers
/// can tell a revoked refresh token from a transient endpoint problem.
pub async fn refresh_session(
    client: &reqwest::Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<SessionTokens> {
    let url = format!("{}{REFRESH_PATH}", base_url.trim_end_matches('/'));
    let response = client
        .post(url)
        .json(&serde_json::json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::InvalidCredentials(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::RefreshFailed(format!(
            "refresh endpoint returned {status}: {body}"
        )));
    }

    let envelope = response
        .json::<RefreshEnvelope>()
        .await
        .map_err(|e| Error::RefreshFailed(format!("invalid refresh response: {e}")))?;

    match envelope.data {
        Some(tokens) if envelope.success => Ok(tokens),
        _ => Err(Error::RefreshFailed(
            "refresh envelope missing token data".into(),
        )),
    }
}
