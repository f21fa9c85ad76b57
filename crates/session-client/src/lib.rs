//! Authenticated request client for the Talentflow API
//!
//! Wraps `reqwest` with credential attachment, 401 detection, single-flight
//! token refresh, and at-most-one automatic retry. A generic TTL cache is
//! provided for read-heavy callers that want to suppress redundant
//! aggregation calls; it is composable and sits outside the request path.
//!
//! Request flow:
//! 1. `AuthenticatedClient::request()` attaches the stored (or pinned)
//!    access token and sends
//! 2. On 401 it calls `RefreshCoordinator::refresh()`; concurrent 401s
//!    share one refresh call and one outcome
//! 3. A successful refresh writes the new pair to `CredentialStore` and
//!    the request is reissued once with the fresh token
//! 4. A failed refresh clears the store and the original 401 surfaces

pub mod cache;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod refresh;

pub use cache::TtlCache;
pub use client::{AuthenticatedClient, RequestOptions};
pub use config::Config;
pub use envelope::{ErrorBody, ErrorEnvelope, SuccessEnvelope};
pub use error::{ApiError, Result};
pub use refresh::RefreshCoordinator;
