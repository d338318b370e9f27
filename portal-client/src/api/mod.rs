//! Backend API access
//!
//! The credential pipeline and the typed auth endpoints. All traffic to the
//! portal backend flows through [`client::ApiClient`], which owns the bearer
//! attach / refresh / replay protocol so callers never see an expired
//! access credential.

use portal_core::{ApiConfig, ErrorContext, PortalError, PortalResult};

pub mod auth;
pub mod client;

pub use auth::{AuthService, NewAccount};
pub use client::ApiClient;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the backend API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Bounded timeout for the token refresh exchange, in seconds
    pub refresh_timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_seconds: 30,
            refresh_timeout_seconds: 10,
            user_agent: "portal-client/0.1".to_string(),
        }
    }
}

impl ApiClientConfig {
    /// Create a configuration for the given backend base URL
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the refresh exchange timeout
    pub fn with_refresh_timeout(mut self, refresh_timeout_seconds: u64) -> Self {
        self.refresh_timeout_seconds = refresh_timeout_seconds;
        self
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            refresh_timeout_seconds: config.refresh_timeout_seconds,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Helper function to create the underlying HTTP client
pub(crate) fn create_http_client(config: &ApiClientConfig) -> PortalResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            PortalError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| PortalError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

    Ok(client)
}

/// Helper function to map a non-success backend response to an error.
///
/// The payload travels verbatim: business errors belong to the calling page,
/// the core only looks at the status code.
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
) -> PortalError {
    let status = response.status();
    let url = response.url().clone();

    let error_body = response.text().await.unwrap_or_default();

    PortalError::Api {
        status: status.as_u16(),
        message: if error_body.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            error_body
        },
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_metadata("url", url.as_str()),
    }
}
