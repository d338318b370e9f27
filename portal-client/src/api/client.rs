//! Credential pipeline
//!
//! Wraps every outgoing backend request with the bearer protocol: attach the
//! current access credential, detect an authorization failure, refresh the
//! credential once, and replay the failed request exactly once. Refresh
//! exchanges are single-flight: concurrent 401s wait for one exchange and
//! share its outcome instead of each minting their own.

use super::{create_http_client, handle_response_error, ApiClientConfig};
use crate::session::SessionStore;
use portal_core::{PortalError, PortalResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const COMPONENT: &str = "credential_pipeline";

/// Refresh exchange request body
#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Refresh exchange response. The backend may or may not rotate the refresh
/// credential; `refresh` stays `None` when it does not.
#[derive(Deserialize)]
struct RefreshedTokens {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// HTTP client for the portal backend with transparent credential handling
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiClientConfig,
    store: SessionStore,
    /// Serializes refresh exchanges; waiters re-read the store afterwards
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a new client over the given session store
    pub fn new(config: ApiClientConfig, store: SessionStore) -> PortalResult<Self> {
        let http = create_http_client(&config)?;

        info!("Created portal API client for {}", config.base_url);

        Ok(Self {
            http,
            config,
            store,
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    /// The session store this client reads credentials from
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> PortalResult<T> {
        let response = self.execute::<()>(Method::GET, path, None).await?;
        self.decode(response, path).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> PortalResult<T> {
        let response = self.execute(Method::POST, path, Some(body)).await?;
        self.decode(response, path).await
    }

    /// POST a JSON body, ignoring any response payload
    pub async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> PortalResult<()> {
        let response = self.execute(Method::POST, path, Some(body)).await?;
        if !response.status().is_success() {
            return Err(handle_response_error(response, path).await);
        }
        Ok(())
    }

    /// PATCH a JSON body and decode the JSON response
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> PortalResult<T> {
        let response = self.execute(Method::PATCH, path, Some(body)).await?;
        self.decode(response, path).await
    }

    /// Run one request through the attach / refresh / replay protocol.
    ///
    /// Every non-401 response is returned unchanged for the caller to
    /// interpret. A 401 triggers a single refresh-and-replay; a second 401
    /// (or a failed refresh) terminates with the original authorization
    /// error.
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> PortalResult<reqwest::Response> {
        let url = self.endpoint(path);
        let mut token = self.store.access_token().await;
        // Explicit attempt state, local to this call. Nothing is smuggled
        // onto shared request objects, so concurrent requests cannot leak
        // retry flags into each other.
        let mut replayed = false;

        loop {
            let mut request = self.http.request(method.clone(), url.as_str());
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }

            debug!(%method, url = %url, replayed, "Dispatching backend request");

            let response = request.send().await.map_err(|e| {
                PortalError::network(
                    format!("Request to {} failed: {}", url, e),
                    Box::new(e),
                    COMPONENT,
                )
            })?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if replayed {
                // The replayed request was rejected again; terminate.
                return Err(Self::unauthorized_from(response).await);
            }
            replayed = true;

            match self.refresh_access(token.as_deref()).await {
                Ok(fresh) => token = Some(fresh),
                Err(refresh_err) => {
                    debug!(
                        "Refresh failed ({}), propagating original authorization error",
                        refresh_err
                    );
                    return Err(Self::unauthorized_from(response).await);
                }
            }
        }
    }

    /// Obtain a usable access credential after a 401, refreshing at most
    /// once across all concurrent callers.
    ///
    /// On refresh failure the session is expired (cleared, with the
    /// `Expired` event as the redirect-to-login signal) and the error is
    /// returned for the caller to translate.
    async fn refresh_access(&self, stale_token: Option<&str>) -> PortalResult<String> {
        let _permit = self.refresh_gate.lock().await;

        // Another request may have finished a refresh while we waited for
        // the gate; reuse its credential instead of spending the exchange.
        let session = self.store.current().await;
        if let Some(current) = session.access_token.as_deref() {
            if stale_token != Some(current) {
                debug!("Reusing access credential refreshed by a concurrent request");
                return Ok(current.to_string());
            }
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            self.store.expire().await;
            return Err(PortalError::refresh_failed(
                "no refresh credential available",
                COMPONENT,
            ));
        };
        let Some(user) = session.user.clone() else {
            self.store.expire().await;
            return Err(PortalError::refresh_failed(
                "session has no user to refresh",
                COMPONENT,
            ));
        };

        let refresh_timeout = Duration::from_secs(self.config.refresh_timeout_seconds);
        let outcome =
            tokio::time::timeout(refresh_timeout, self.exchange_refresh(&refresh_token)).await;

        match outcome {
            Ok(Ok(tokens)) => {
                // Honor a rotated refresh credential; keep ours otherwise.
                let next_refresh = tokens.refresh.unwrap_or(refresh_token);
                self.store
                    .establish(user, tokens.access.clone(), next_refresh)
                    .await;
                info!("Access credential refreshed");
                Ok(tokens.access)
            }
            Ok(Err(e)) => {
                warn!("Credential refresh failed: {}", e);
                self.store.expire().await;
                Err(e)
            }
            Err(_) => {
                warn!(
                    "Credential refresh timed out after {}s",
                    refresh_timeout.as_secs()
                );
                self.store.expire().await;
                Err(PortalError::timeout(
                    "token refresh",
                    refresh_timeout.as_millis() as u64,
                    COMPONENT,
                ))
            }
        }
    }

    /// Raw refresh exchange. Deliberately bypasses `execute`: the refresh
    /// call itself must never recurse into the 401 protocol.
    async fn exchange_refresh(&self, refresh_token: &str) -> PortalResult<RefreshedTokens> {
        let url = self.endpoint("/auth/token/refresh/");

        let response = self
            .http
            .post(url.as_str())
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|e| {
                PortalError::network(
                    format!("Refresh exchange failed: {}", e),
                    Box::new(e),
                    COMPONENT,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::refresh_failed(
                format!("refresh exchange rejected with {}", status.as_u16()),
                COMPONENT,
            ));
        }

        response.json().await.map_err(|e| {
            PortalError::network(
                format!("Failed to decode refresh response: {}", e),
                Box::new(e),
                COMPONENT,
            )
        })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> PortalResult<T> {
        if !response.status().is_success() {
            return Err(handle_response_error(response, operation).await);
        }

        response.json().await.map_err(|e| {
            PortalError::network(
                format!("Failed to decode response body: {}", e),
                Box::new(e),
                COMPONENT,
            )
        })
    }

    async fn unauthorized_from(response: reqwest::Response) -> PortalError {
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            "request rejected with 401".to_string()
        } else {
            body
        };
        PortalError::unauthorized(message, COMPONENT)
    }
}
