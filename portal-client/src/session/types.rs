//! Session types and transitions
//!
//! The session is the single process-wide record of the authenticated
//! identity and its credentials. It only ever changes through two
//! transitions, `establish` and `clear`; everything else reads snapshots.

use portal_core::{Role, UserProfile};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of the authentication session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user, if any
    pub user: Option<UserProfile>,
    /// Short-lived bearer credential attached to API calls
    #[serde(rename = "token")]
    pub access_token: Option<String>,
    /// Longer-lived credential used only to mint new access tokens
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
    /// True iff `user` and `access_token` were set together
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
}

impl Session {
    /// The unauthenticated session
    pub fn empty() -> Self {
        Self {
            user: None,
            access_token: None,
            refresh_token: None,
            is_authenticated: false,
        }
    }

    /// Role of the authenticated user, if any
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    /// User id of the authenticated user, if any
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::empty()
    }
}

/// Partial user update merged by `SessionStore::update_user`.
///
/// Carries no `role` and no `id`: the role is immutable for the lifetime of
/// a session, so changing it requires a fresh login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }

    /// Merge the set fields into an existing profile
    pub(crate) fn apply_to(&self, user: &mut UserProfile) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = Some(last_name.clone());
        }
    }
}

/// Session lifecycle notifications broadcast to interested consumers.
///
/// The navigation layer subscribes to these instead of the core performing
/// redirects itself: `Expired` is the signal to route to the login entry
/// point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was established (login or successful credential refresh)
    Established,
    /// The user profile was merged in place
    UserUpdated,
    /// The session was cleared by an explicit logout
    Cleared,
    /// The session was cleared because credentials could not be refreshed
    Expired,
}
