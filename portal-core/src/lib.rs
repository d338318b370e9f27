//! Portal Core - Shared types, errors and configuration
//!
//! This crate defines the foundation the rest of the portal client builds on:
//! the unified error type, the role/user data model, configuration loading and
//! the logging bootstrap.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tokio;
pub use tracing;
