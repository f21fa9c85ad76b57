//! Error types for session credential operations

/// Errors from the refresh endpoint interaction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("refresh rejected: {0}")]
    InvalidCredentials(String),

    #[error("refresh failed: {0}")]
    RefreshFailed(String),
}

/// Result alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;
