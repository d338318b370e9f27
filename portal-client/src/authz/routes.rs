//! Role routing
//!
//! Fixed landing routes per role plus the shared navigation entry points.

use portal_core::Role;
use tracing::warn;

/// Login entry point
pub const LOGIN_ROUTE: &str = "/login";
/// Page shown on a role mismatch
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";
/// Generic fallback landing page
pub const DASHBOARD_ROOT: &str = "/dashboard";

/// Default landing route for a role. Total over the role enumeration.
pub fn default_route_for(role: Role) -> &'static str {
    match role {
        Role::Student => "/student/dashboard",
        Role::Registrar => "/registrar/dashboard",
        Role::Admissions => "/admissions/dashboard",
        Role::Head => "/head/dashboard",
        Role::Professor => "/professor/dashboard",
        Role::Admin => "/admin/dashboard",
    }
}

/// Landing route for a raw role string as served by the backend.
///
/// A value outside the role enumeration falls back to the generic dashboard
/// root; navigation must never fail on an unrecognized role.
pub fn landing_route(role_name: &str) -> &'static str {
    match role_name.parse::<Role>() {
        Ok(role) => default_route_for(role),
        Err(_) => {
            warn!(
                role = role_name,
                "Unknown role, falling back to generic dashboard"
            );
            DASHBOARD_ROOT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_role_has_a_distinct_landing_route() {
        let routes: HashSet<&str> = Role::ALL.iter().map(|r| default_route_for(*r)).collect();
        assert_eq!(routes.len(), Role::ALL.len());
        assert!(routes.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn landing_route_resolves_known_roles() {
        assert_eq!(landing_route("student"), "/student/dashboard");
        assert_eq!(landing_route("admissions"), "/admissions/dashboard");
    }

    #[test]
    fn unknown_role_falls_back_instead_of_failing() {
        assert_eq!(landing_route("janitor"), DASHBOARD_ROOT);
        assert_eq!(landing_route(""), DASHBOARD_ROOT);
    }
}
