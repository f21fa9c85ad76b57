//! Session credential library for the Talentflow API
//!
//! Provides the credential pair model, a file-backed credential store with
//! change broadcast, and the raw refresh-endpoint call. This crate is a
//! standalone library with no dependency on the request client — it can be
//! tested and used independently.
//!
//! Credential flow:
//! 1. Login/registration handler calls `CredentialStore::write()`
//! 2. Consumers read tokens via `CredentialStore::read()`
//! 3. On access-token expiry the client calls `token::refresh_session()`
//! 4. New pair stored via `CredentialStore::write()`, listeners notified
//! 5. Logout or terminal refresh failure calls `CredentialStore::clear()`

pub mod credentials;
pub mod error;
pub mod token;

pub use credentials::{CredentialChange, CredentialPair, CredentialStore, SessionTokens};
pub use error::{Error, Result};
pub use token::{REFRESH_PATH, refresh_session};
