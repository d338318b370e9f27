//! Authorization gate
//!
//! Maps session state plus a page's required role set to a navigation
//! outcome. Pure decision logic: the gate never redirects, never mutates the
//! session, and must be consulted freshly on every navigation because
//! session state can change in between (e.g. an external logout).

use super::routes::{LOGIN_ROUTE, UNAUTHORIZED_ROUTE};
use crate::session::{Session, SessionStore};
use portal_core::Role;

/// Outcome of an authorization check for one navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render the requested page
    Allow,
    /// No authenticated session; go to the login entry point
    RedirectLogin,
    /// Authenticated, but the role may not view this page
    RedirectUnauthorized,
}

impl AccessDecision {
    /// Route the navigation layer should redirect to, if any
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectLogin => Some(LOGIN_ROUTE),
            AccessDecision::RedirectUnauthorized => Some(UNAUTHORIZED_ROUTE),
        }
    }
}

/// Decide whether a session may view a page requiring the given roles.
///
/// An empty `required` set means "authenticated, any role".
pub fn authorize(required: &[Role], session: &Session) -> AccessDecision {
    if !session.is_authenticated {
        return AccessDecision::RedirectLogin;
    }

    if required.is_empty() {
        return AccessDecision::Allow;
    }

    match session.role() {
        Some(role) if required.contains(&role) => AccessDecision::Allow,
        _ => AccessDecision::RedirectUnauthorized,
    }
}

/// Gate bound to a live session store.
///
/// Snapshots the store on every call, so each navigation sees current
/// session state rather than whatever was true when the guard was built.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    store: SessionStore,
}

impl NavigationGuard {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Evaluate the gate against a fresh session snapshot
    pub async fn evaluate(&self, required: &[Role]) -> AccessDecision {
        authorize(required, &self.store.current().await)
    }
}
