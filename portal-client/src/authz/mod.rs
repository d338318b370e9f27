//! Route authorization
//!
//! The navigation-facing decision layer: the gate maps session state to an
//! access decision, the router maps roles to landing routes.

pub mod gate;
pub mod routes;

pub use gate::{authorize, AccessDecision, NavigationGuard};
pub use routes::{
    default_route_for, landing_route, DASHBOARD_ROOT, LOGIN_ROUTE, UNAUTHORIZED_ROUTE,
};
