//! Session persistence
//!
//! Serializes the full session snapshot to a single JSON document under a
//! fixed storage key after every transition, and restores it once at startup.
//! Corrupted or missing stored data always degrades to the empty session.

use super::Session;
use portal_core::{ErrorContext, PortalError, PortalResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixed storage key the session document lives under
pub const SESSION_STORAGE_KEY: &str = "auth-session";

/// File-backed persistence for the session snapshot
#[derive(Debug, Clone)]
pub struct SessionStorage {
    /// Path of the session document
    path: PathBuf,
}

impl SessionStorage {
    /// Create a storage handle rooted at the given data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> PortalResult<Self> {
        let data_dir = data_dir.as_ref();

        std::fs::create_dir_all(data_dir).map_err(|e| PortalError::Storage {
            message: format!("Failed to create data directory: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("session_storage")
                .with_operation("create_dir")
                .with_metadata("data_dir", &data_dir.display().to_string()),
        })?;

        Ok(Self {
            path: data_dir.join(format!("{}.json", SESSION_STORAGE_KEY)),
        })
    }

    /// Path of the persisted document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the persisted session.
    ///
    /// A missing, unreadable or malformed document yields the empty session;
    /// this never fails.
    pub fn load(&self) -> Session {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No persisted session at {}", self.path.display());
                return Session::empty();
            }
            Err(e) => {
                warn!(
                    "Failed to read persisted session from {}: {}",
                    self.path.display(),
                    e
                );
                return Session::empty();
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                // A tampered document must not fabricate an authenticated
                // state the two transitions could never have produced.
                if session.is_authenticated
                    && (session.user.is_none() || session.access_token.is_none())
                {
                    warn!("Persisted session violates invariants, resetting to empty");
                    return Session::empty();
                }
                debug!("Restored session from {}", self.path.display());
                session
            }
            Err(e) => {
                warn!(
                    "Malformed persisted session in {}: {}, resetting to empty",
                    self.path.display(),
                    e
                );
                Session::empty()
            }
        }
    }

    /// Persist the given snapshot, replacing the previous document
    pub fn save(&self, session: &Session) -> PortalResult<()> {
        let json_data = serde_json::to_string_pretty(session)?;

        std::fs::write(&self.path, json_data).map_err(|e| PortalError::Storage {
            message: format!("Failed to write session document: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("session_storage")
                .with_operation("save")
                .with_metadata("path", &self.path.display().to_string()),
        })?;

        debug!("Persisted session to {}", self.path.display());
        Ok(())
    }
}
