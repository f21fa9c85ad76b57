//! Common types for the Talentflow client libraries

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
