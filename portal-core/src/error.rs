//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type PortalResult<T> = Result<T, PortalError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the portal client
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Non-2xx backend response outside the authorization protocol. The
    /// payload is carried verbatim for the caller to display; the core only
    /// interprets the status code.
    #[error("Backend error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    /// Terminal 401: the request was replayed once with a refreshed
    /// credential and was still rejected, or refresh was impossible.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        context: ErrorContext,
    },

    #[error("Credential refresh failed: {message}")]
    RefreshFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("No active session")]
    NoActiveSession { context: ErrorContext },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Unknown role: {value}")]
    UnknownRole { value: String, context: ErrorContext },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PortalError {
    /// Create a network error wrapping a transport failure
    pub fn network<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
        component: &str,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source),
            context: ErrorContext::new(component),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S, component: &str) -> Self {
        Self::Unauthorized {
            message: message.into(),
            context: ErrorContext::new(component)
                .with_suggestion("Log in again to obtain fresh credentials"),
        }
    }

    /// Create a refresh failure error
    pub fn refresh_failed<S: Into<String>>(message: S, component: &str) -> Self {
        Self::RefreshFailed {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component),
        }
    }

    /// Create a no-active-session error
    pub fn no_active_session(component: &str) -> Self {
        Self::NoActiveSession {
            context: ErrorContext::new(component)
                .with_suggestion("Log in before updating the session"),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S, component: &str) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component)
                .with_suggestion("Check your configuration file"),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64, component: &str) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
            context: ErrorContext::new(component),
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            PortalError::Network { context, .. } => Some(context),
            PortalError::Api { context, .. } => Some(context),
            PortalError::Unauthorized { context, .. } => Some(context),
            PortalError::RefreshFailed { context, .. } => Some(context),
            PortalError::NoActiveSession { context } => Some(context),
            PortalError::Storage { context, .. } => Some(context),
            PortalError::Config { context, .. } => Some(context),
            PortalError::Validation { context, .. } => Some(context),
            PortalError::Timeout { context, .. } => Some(context),
            PortalError::UnknownRole { context, .. } => Some(context),
            _ => None,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            PortalError::Api { status, .. } => Some(*status),
            PortalError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    /// Check if error is recoverable by retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PortalError::Network { .. } | PortalError::Timeout { .. }
        )
    }

    /// Whether this error must force a return to the login entry point
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            PortalError::Unauthorized { .. }
                | PortalError::RefreshFailed { .. }
                | PortalError::NoActiveSession { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        if self.is_recoverable() {
            warn!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Recoverable error occurred"
            );
        } else {
            error!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Error occurred"
            );
        }
    }
}
