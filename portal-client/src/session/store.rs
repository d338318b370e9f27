//! Session store
//!
//! Owns the process-wide session as an explicit, injectable state container.
//! The credential pipeline and the authorization gate both receive a handle
//! instead of reaching for a hidden global, so tests construct a fresh store
//! per case. Only the transitions defined here mutate session state; every
//! other component reads immutable snapshots via `current`.

use super::{Session, SessionEvent, SessionStorage, UserUpdate};
use portal_core::{PortalError, PortalResult, UserProfile};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Buffered session events per subscriber
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Shared handle to the authentication session
#[derive(Debug, Clone)]
pub struct SessionStore {
    session: Arc<RwLock<Session>>,
    storage: Option<SessionStorage>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create an ephemeral store starting from the empty session
    pub fn in_memory() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            session: Arc::new(RwLock::new(Session::empty())),
            storage: None,
            events,
        }
    }

    /// Create a persistent store, restoring any previously saved session
    pub fn with_storage(storage: SessionStorage) -> Self {
        let initial = storage.load();
        if initial.is_authenticated {
            info!(
                user = initial.user_id().unwrap_or("<unknown>"),
                "Restored authenticated session from storage"
            );
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            session: Arc::new(RwLock::new(initial)),
            storage: Some(storage),
            events,
        }
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Return an immutable snapshot of the current session
    pub async fn current(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Current access token, if any
    pub async fn access_token(&self) -> Option<String> {
        self.session.read().await.access_token.clone()
    }

    /// Replace the whole session atomically and mark it authenticated.
    ///
    /// This is the only transition that sets credentials; it always succeeds.
    pub async fn establish(
        &self,
        user: UserProfile,
        access_token: String,
        refresh_token: String,
    ) {
        let snapshot = {
            let mut session = self.session.write().await;
            *session = Session {
                user: Some(user),
                access_token: Some(access_token),
                refresh_token: Some(refresh_token),
                is_authenticated: true,
            };
            session.clone()
        };

        info!(
            user = snapshot.user_id().unwrap_or("<unknown>"),
            role = %snapshot.role().map(|r| r.to_string()).unwrap_or_default(),
            "Session established"
        );

        self.persist(&snapshot);
        let _ = self.events.send(SessionEvent::Established);
    }

    /// Reset to the empty session. Idempotent.
    pub async fn clear(&self) {
        self.reset(SessionEvent::Cleared).await;
    }

    /// Reset to the empty session because credentials could not be
    /// refreshed. Identical to `clear` except for the event emitted, which
    /// the navigation layer maps to a redirect to the login entry point.
    pub async fn expire(&self) {
        self.reset(SessionEvent::Expired).await;
    }

    async fn reset(&self, event: SessionEvent) {
        let snapshot = {
            let mut session = self.session.write().await;
            *session = Session::empty();
            session.clone()
        };

        debug!(?event, "Session cleared");

        self.persist(&snapshot);
        let _ = self.events.send(event);
    }

    /// Merge profile fields into the existing user.
    ///
    /// Fails with `NoActiveSession` when no user is established; tokens and
    /// role are never touched by this transition.
    pub async fn update_user(&self, update: UserUpdate) -> PortalResult<()> {
        let snapshot = {
            let mut session = self.session.write().await;
            if !session.is_authenticated {
                return Err(PortalError::no_active_session("session_store"));
            }
            let user = session
                .user
                .as_mut()
                .ok_or_else(|| PortalError::no_active_session("session_store"))?;

            update.apply_to(user);
            session.clone()
        };

        self.persist(&snapshot);
        let _ = self.events.send(SessionEvent::UserUpdated);
        Ok(())
    }

    /// Persist a snapshot after a transition. A storage failure is logged
    /// and does not fail the transition.
    fn persist(&self, snapshot: &Session) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(snapshot) {
                warn!("Failed to persist session: {}", e);
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
