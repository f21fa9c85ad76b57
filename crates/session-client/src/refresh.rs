//! Single-flight credential refresh
//!
//! Deduplicates concurrent refresh attempts into one transport call. A
//! tokio `Mutex` is the flight gate and an atomic generation counter
//! records settlements: a caller snapshots the generation before queueing
//! on the gate, and if the generation advanced while it waited, another
//! caller already completed the refresh and its outcome is shared.
//!
//! Refresh failures are never errors at this surface. They degrade to a
//! cleared credential pair and a `None` outcome, so the caller's original
//! 401 is what ultimately surfaces.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use session_auth::{CredentialStore, SessionTokens, refresh_session};

/// Guarantees at most one in-flight refresh per instance.
///
/// One instance per process/session, injected into consumers; the
/// `AuthenticatedClient` holds it behind an `Arc` so every request path
/// shares the same gate.
pub struct RefreshCoordinator {
    store: Arc<CredentialStore>,
    http: reqwest::Client,
    base_url: String,
    generation: AtomicU64,
    gate: Mutex<Option<SessionTokens>>,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<CredentialStore>, http: reqwest::Client, base_url: String) -> Self {
        Self {
            store,
            http,
            base_url,
            generation: AtomicU64::new(0),
            gate: Mutex::new(None),
        }
    }

    /// Refresh the credential pair, coalescing with any in-flight attempt.
    ///
    /// Callers that queued while a refresh was outstanding observe the
    /// identical outcome without a second transport call. Once settled the
    /// gate is free again, so a later call starts a fresh attempt.
    ///
    /// `None` means the refresh failed or no refresh token was stored; in
    /// the failure case the store has been cleared.
    pub async fn refresh(&self) -> Option<SessionTokens> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut outcome_slot = self.gate.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            // A refresh settled while we waited on the gate; share it
            debug!("joining completed refresh outcome");
            return outcome_slot.clone();
        }

        let outcome = self.run_refresh().await;
        *outcome_slot = outcome.clone();
        self.generation.fetch_add(1, Ordering::Release);
        outcome
    }

    /// The single flight: read the refresh token, call the endpoint,
    /// write or clear the store.
    async fn run_refresh(&self) -> Option<SessionTokens> {
        let Some(refresh_token) = self.store.read().refresh_token else {
            debug!("no refresh token stored, skipping refresh call");
            return None;
        };

        match refresh_session(&self.http, &self.base_url, &refresh_token).await {
            Ok(tokens) => {
                self.store.write(tokens.clone());
                info!("credential refresh succeeded");
                Some(tokens)
            }
            Err(e) => {
                warn!(error = %e, "credential refresh failed, clearing pair");
                self.store.clear();
                None
            }
        }
    }
}
