//! Core data type definitions

use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, PortalError};

/// Portal roles - closed enumeration, one per dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Registrar,
    Admissions,
    Head,
    Professor,
    Admin,
}

impl Role {
    /// All roles, in declaration order
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Registrar,
        Role::Admissions,
        Role::Head,
        Role::Professor,
        Role::Admin,
    ];

    /// Wire representation used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Registrar => "registrar",
            Role::Admissions => "admissions",
            Role::Head => "head",
            Role::Professor => "professor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "registrar" => Ok(Role::Registrar),
            "admissions" => Ok(Role::Admissions),
            "head" => Ok(Role::Head),
            "professor" => Ok(Role::Professor),
            "admin" => Ok(Role::Admin),
            other => Err(PortalError::UnknownRole {
                value: other.to_string(),
                context: ErrorContext::new("role").with_operation("parse"),
            }),
        }
    }
}

/// Authenticated user profile as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique user identifier
    pub id: String,
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Portal role; immutable for the lifetime of a session
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserProfile {
    /// Get user display string
    pub fn display_string(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {} ({})", first, last, self.role),
            _ => format!("{} ({})", self.username, self.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_wire_format() {
        for role in Role::ALL {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("Registrar".parse::<Role>().unwrap(), Role::Registrar);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn unknown_role_is_an_error_not_a_panic() {
        let err = "janitor".parse::<Role>().unwrap_err();
        assert!(matches!(err, PortalError::UnknownRole { .. }));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Head).unwrap();
        assert_eq!(json, "\"head\"");
    }
}
