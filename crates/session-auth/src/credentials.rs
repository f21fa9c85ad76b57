//! Credential pair storage with change broadcast
//!
//! Holds the access/refresh pair as a single JSON document so both fields
//! are always written and read together — a reader can never see an access
//! token from one write next to a refresh token from another. Persistence
//! uses atomic temp-file + rename and is best effort: a store without a
//! usable file degrades to process memory instead of failing.
//!
//! All operations are synchronous and never suspend. Change listeners
//! subscribe to a broadcast channel and re-read the store when notified;
//! the event itself carries no token data.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// The access/refresh token tuple.
///
/// The only partial-looking state is the fully cleared `{None, None}`;
/// any other state carries both fields from the same `write`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl CredentialPair {
    /// Whether the pair is in the logged-out state.
    pub fn is_cleared(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Freshly minted tokens from login, registration, or a refresh.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Zero-payload change notification.
///
/// Consumers re-read the store rather than receive the pair inline, so a
/// late-delivered event can never hand out a stale token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialChange;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Single source of truth for the session credential pair.
///
/// A `std::sync::Mutex` guards the in-memory pair; the lock is held only
/// for non-suspending critical sections, so the store is safe to call from
/// async and sync contexts alike.
pub struct CredentialStore {
    path: Option<PathBuf>,
    state: Mutex<CredentialPair>,
    changes: broadcast::Sender<CredentialChange>,
}

impl CredentialStore {
    /// Open a store backed by the given file.
    ///
    /// A missing, unreadable, or corrupt file starts the store cleared
    /// rather than failing — `read` must never throw.
    pub fn open(path: PathBuf) -> Self {
        let pair = load_file(&path);
        Self {
            path: Some(path),
            state: Mutex::new(pair),
            changes: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        }
    }

    /// Create a store with no durable backing (tests, ephemeral contexts).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(CredentialPair::default()),
            changes: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        }
    }

    /// Current pair. Never fails; cleared when unset.
    pub fn read(&self) -> CredentialPair {
        self.state.lock().expect("credential lock poisoned").clone()
    }

    /// Store a new pair, persist it, then notify listeners.
    ///
    /// Both fields land in one locked update and one atomic file rename.
    /// Persistence failure is logged and does not unwind; the in-memory
    /// pair still updates.
    pub fn write(&self, tokens: SessionTokens) {
        let pair = CredentialPair {
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
        };
        {
            let mut state = self.state.lock().expect("credential lock poisoned");
            *state = pair.clone();
            self.persist(&pair);
        }
        debug!("credential pair updated");
        self.notify();
    }

    /// Remove both fields, persist the cleared state, then notify.
    pub fn clear(&self) {
        let cleared = CredentialPair::default();
        {
            let mut state = self.state.lock().expect("credential lock poisoned");
            *state = cleared.clone();
            self.persist(&cleared);
        }
        debug!("credential pair cleared");
        self.notify();
    }

    /// Subscribe to change notifications.
    ///
    /// Dropping the receiver unsubscribes. Events fire after the
    /// triggering `write`/`clear` returns; no further ordering is
    /// guaranteed between listeners.
    pub fn subscribe(&self) -> broadcast::Receiver<CredentialChange> {
        self.changes.subscribe()
    }

    /// Re-read the backing file and notify if the stored pair differs.
    ///
    /// This is the pickup path for writes made by another process sharing
    /// the same file. Returns whether the in-memory pair changed.
    pub fn reload(&self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let on_disk = load_file(path);
        let changed = {
            let mut state = self.state.lock().expect("credential lock poisoned");
            if *state == on_disk {
                false
            } else {
                *state = on_disk;
                true
            }
        };
        if changed {
            debug!("credential pair reloaded from disk");
            self.notify();
        }
        changed
    }

    /// Best-effort persistence; called with the state lock held so file
    /// writes are serialized with in-memory updates.
    fn persist(&self, pair: &CredentialPair) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_atomic(path, pair) {
            warn!(path = %path.display(), error = %e, "failed to persist credentials");
        }
    }

    fn notify(&self) {
        // Err only means no listeners are currently subscribed
        let _ = self.changes.send(CredentialChange);
    }
}

/// Read and parse the credential file; cleared pair on any failure.
fn load_file(path: &Path) -> CredentialPair {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "credential file unreadable, starting cleared");
            }
            return CredentialPair::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(pair) => pair,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "credential file corrupt, starting cleared");
            CredentialPair::default()
        }
    }
}

/// Sequence number making temp names unique per call, not just per
/// process: sibling stores sharing a directory must never interleave
/// write and rename on the same temp file.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write the pair to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target, so a crash mid-write can never leave a half-written pair.
/// Permissions are 0600 since the file contains session tokens.
fn write_atomic(path: &Path, pair: &CredentialPair) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(pair).map_err(std::io::Error::other)?;

    let dir = path.parent().ok_or_else(|| {
        std::io::Error::other("credential path has no parent directory")
    })?;

    let tmp_path = dir.join(format!(
        ".session.tmp.{}.{}",
        std::process::id(),
        TMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;
    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
