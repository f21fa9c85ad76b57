//! Authenticated request issuing with refresh-and-retry
//!
//! One logical request: attach the bearer token, send, and on 401 recover
//! through the refresh coordinator with at most one reissue. Transport
//! errors pass through unretried; everything else decodes through the
//! response envelope into a typed error or payload.

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use session_auth::CredentialStore;

use crate::config::Config;
use crate::envelope::{decode_failure, decode_success};
use crate::error::{ApiError, Result};
use crate::refresh::RefreshCoordinator;

/// Per-call options for `AuthenticatedClient::request`.
#[derive(Default, Clone)]
pub struct RequestOptions {
    /// JSON body; when present, `Content-Type: application/json` is set.
    pub body: Option<serde_json::Value>,
    /// Pin a specific access token for this call, overriding the stored
    /// one. A pinned token can still be expired: auto-refresh is still
    /// attempted, and the retried request uses the refreshed token.
    pub token: Option<String>,
    /// Surface a 401 directly instead of refreshing. Used by auth
    /// endpoints themselves (login, logout) where a 401 is an answer.
    pub skip_auto_refresh: bool,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("body", &self.body)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("skip_auto_refresh", &self.skip_auto_refresh)
            .finish()
    }
}

/// HTTP client that attaches credentials, detects expiry, and retries at
/// most once after a coordinated refresh.
///
/// The store and coordinator are shared via `Arc`: every clone of this
/// client and any other consumer in the process observe the same
/// credential pair and the same refresh gate.
pub struct AuthenticatedClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
    refresher: Arc<RefreshCoordinator>,
    pinned_token: Option<String>,
}

impl AuthenticatedClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        store: Arc<CredentialStore>,
        refresher: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            refresher,
            pinned_token: None,
        }
    }

    /// Pin a client-level access token, used when neither the call options
    /// nor resolution order below supply one. Per-call `options.token`
    /// still takes precedence, and a pinned token can still expire: on 401
    /// the retry carries the refreshed token, not this one.
    pub fn with_pinned_token(mut self, token: Option<String>) -> Self {
        self.pinned_token = token;
        self
    }

    /// Build a client, store, and coordinator from configuration.
    ///
    /// A SESSION_API_TOKEN overlay in the config becomes the client-level
    /// pinned token.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout())
            .build()?;
        let store = Arc::new(match &config.credentials.path {
            Some(path) => CredentialStore::open(path.clone()),
            None => CredentialStore::in_memory(),
        });
        let refresher = Arc::new(RefreshCoordinator::new(
            store.clone(),
            http.clone(),
            config.api.base_url.clone(),
        ));
        Ok(
            Self::new(http, config.api.base_url.clone(), store, refresher).with_pinned_token(
                config.api.pinned_token.as_ref().map(|t| t.expose().clone()),
            ),
        )
    }

    /// The credential store backing this client.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Perform one logical request and decode the enveloped response.
    ///
    /// At most one retry happens, strictly ordered after the refresh
    /// outcome is known; the retried request always carries the token the
    /// coordinator produced, never the pinned one.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let request_id = Uuid::new_v4();
        let token = options
            .token
            .clone()
            .or_else(|| self.pinned_token.clone())
            .or_else(|| self.store.read().access_token);
        let had_token = token.is_some();

        debug!(%request_id, method = %method, path, "issuing request");
        let response = self
            .send_once(&method, path, &options.body, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && had_token
            && !options.skip_auto_refresh
        {
            // Hold the original 401 so it can surface if refresh fails
            let original = Self::decode::<T>(response).await;

            debug!(%request_id, "unauthorized, attempting credential refresh");
            match self.refresher.refresh().await {
                Some(tokens) => {
                    debug!(%request_id, "refresh succeeded, reissuing request once");
                    let retry = self
                        .send_once(&method, path, &options.body, Some(&tokens.access_token))
                        .await?;
                    return Self::decode(retry).await;
                }
                None => {
                    warn!(%request_id, "refresh yielded no credentials, surfacing 401");
                    return original;
                }
            }
        }

        Self::decode(response).await
    }

    /// GET a path with default options.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, RequestOptions::default())
            .await
    }

    /// POST a JSON body with default options.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let options = RequestOptions {
            body: Some(serde_json::to_value(body).map_err(|e| {
                ApiError::InvalidResponse(format!("unserializable request body: {e}"))
            })?),
            ..Default::default()
        };
        self.request(Method::POST, path, options).await
    }

    /// PUT a JSON body with default options.
    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        let options = RequestOptions {
            body: Some(serde_json::to_value(body).map_err(|e| {
                ApiError::InvalidResponse(format!("unserializable request body: {e}"))
            })?),
            ..Default::default()
        };
        self.request(Method::PUT, path, options).await
    }

    /// DELETE a path with default options.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }

    /// One transport attempt. Transport failures propagate unmodified.
    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        body: &Option<serde_json::Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Decode a settled response through the envelope contract.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(decode_failure(status, &bytes));
        }
        decode_success(&bytes)
    }
}
