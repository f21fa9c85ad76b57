//! Response envelope shapes
//!
//! Every response body at this boundary is wrapped: success is
//! `{"success": true, "data": T}`, failure is `{"error": {"code", "message",
//! "details"?}}` with an optional `meta` block this layer does not
//! interpret. Decoding helpers live here so the client and tests share one
//! reading of the contract.

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Success wrapper: `{"success": true, "data": T}`.
#[derive(Debug, Deserialize)]
pub struct SuccessEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

/// The `error` block of a failure envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// Failure wrapper: `{"error": {...}}`. Unknown fields such as `meta`
/// are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: ErrorBody,
}

/// Turn a non-success body into a typed API error.
///
/// An unparsable body falls back to the empty envelope rather than a
/// parse error: the status code is the primary signal on failure paths.
pub fn decode_failure(status: StatusCode, body: &[u8]) -> ApiError {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    ApiError::Api {
        status: status.as_u16(),
        code: envelope.error.code,
        message: envelope.error.message,
        details: envelope.error.details,
    }
}

/// Unwrap a success body into its payload.
///
/// A malformed success envelope is terminal: the call "succeeded" but the
/// contract was violated, so this is an `InvalidResponse`, never a retry.
pub fn decode_success<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let envelope: SuccessEnvelope<T> = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidResponse(format!("malformed success envelope: {e}")))?;
    match envelope.data {
        Some(data) if envelope.success => Ok(data),
        _ => Err(ApiError::InvalidResponse(
            "success envelope missing data".into(),
        )),
    }
}
