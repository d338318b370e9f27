//! Portal Client - Session and authorization core for the academic portal
//!
//! This crate owns the portal's authentication plumbing:
//!
//! - [`session`]: the persisted authentication session and its single-writer
//!   store
//! - [`api`]: the credential pipeline (bearer attach / refresh / replay) and
//!   the typed auth endpoints
//! - [`authz`]: the route-authorization gate and the role router
//!
//! Page-level concerns stay outside: consumers inject a [`SessionStore`],
//! issue requests through [`ApiClient`]/[`AuthService`], ask
//! [`authz::authorize`] on every navigation, and subscribe to
//! [`SessionEvent`]s to perform redirects themselves.

pub mod api;
pub mod authz;
pub mod session;

pub use api::{ApiClient, ApiClientConfig, AuthService, NewAccount};
pub use authz::{authorize, AccessDecision, NavigationGuard};
pub use session::{Session, SessionEvent, SessionStorage, SessionStore, UserUpdate};

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        authorize, AccessDecision, ApiClient, ApiClientConfig, AuthService, Session, SessionEvent,
        SessionStore, UserUpdate,
    };
    pub use portal_core::{PortalError, PortalResult, Role, UserProfile};
}
