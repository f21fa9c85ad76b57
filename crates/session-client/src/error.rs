//! Typed errors surfaced by the request client

/// Errors from `AuthenticatedClient::request` and its wrappers.
///
/// Transport failures pass through unmodified so callers can inspect the
/// underlying `reqwest` error; business errors carry the structured
/// envelope fields for caller-side branching on `code`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network-level failure (unreachable, timed out, connection reset).
    /// Never retried by this layer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status with a (possibly empty) error envelope.
    #[error("API error {status} [{code}]: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Vec<String>,
    },

    /// Body that violates the envelope contract. Terminal, never retried,
    /// and distinguishable from an authorization failure.
    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Whether this is an HTTP-status error with the given status code.
    pub fn is_status(&self, status: u16) -> bool {
        matches!(self, ApiError::Api { status: s, .. } if *s == status)
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
