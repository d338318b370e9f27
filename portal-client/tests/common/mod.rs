//! Shared test support: a loopback portal backend
//!
//! Stands in for the real backend so the credential pipeline can be driven
//! end to end: counted endpoints, a configurable refresh exchange, and a
//! login contract matching the wire shapes the client speaks.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use portal_client::{ApiClient, ApiClientConfig, SessionStore};
use portal_core::{Role, UserProfile};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock refresh endpoint behaves
pub enum RefreshBehavior {
    /// Exchange succeeds with the given access token, optionally rotating
    /// the refresh token, after an artificial delay
    Grant {
        access: String,
        rotated_refresh: Option<String>,
        delay: Duration,
    },
    /// Exchange is rejected with 401
    Reject,
    /// Exchange never answers within any sane timeout
    Hang,
}

/// Configurable in-process backend
pub struct TestBackend {
    /// The only bearer token `/auth/me/` accepts
    pub accept_token: Mutex<String>,
    /// Password `/auth/login/` accepts
    pub login_password: String,
    /// Refresh exchange behavior
    pub refresh: RefreshBehavior,
    /// Whether `/auth/logout/` fails with 500
    pub fail_logout: bool,
    pub me_hits: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl Default for TestBackend {
    fn default() -> Self {
        Self {
            accept_token: Mutex::new("acc-1".to_string()),
            login_password: "sesame".to_string(),
            refresh: RefreshBehavior::Reject,
            fail_logout: false,
            me_hits: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }
}

impl TestBackend {
    pub fn accepting(token: &str) -> Self {
        Self {
            accept_token: Mutex::new(token.to_string()),
            ..Default::default()
        }
    }

    pub fn me_hits(&self) -> usize {
        self.me_hits.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

pub fn sample_profile(role: Role) -> UserProfile {
    UserProfile {
        id: "u-1".to_string(),
        username: "amara".to_string(),
        email: "amara@example.edu".to_string(),
        role,
        first_name: None,
        last_name: None,
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn me(State(state): State<Arc<TestBackend>>, headers: HeaderMap) -> Response {
    state.me_hits.fetch_add(1, Ordering::SeqCst);

    let expected = state.accept_token.lock().unwrap().clone();
    if bearer(&headers) == Some(expected.as_str()) {
        Json(json!({
            "id": "u-1",
            "username": "amara",
            "email": "amara@example.edu",
            "role": "student",
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "credential expired").into_response()
    }
}

async fn refresh(State(state): State<Arc<TestBackend>>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    match &state.refresh {
        RefreshBehavior::Grant {
            access,
            rotated_refresh,
            delay,
        } => {
            tokio::time::sleep(*delay).await;
            let mut body = json!({ "access": access });
            if let Some(rotated) = rotated_refresh {
                body["refresh"] = json!(rotated);
            }
            Json(body).into_response()
        }
        RefreshBehavior::Reject => {
            (StatusCode::UNAUTHORIZED, "refresh token expired").into_response()
        }
        RefreshBehavior::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn login(
    State(state): State<Arc<TestBackend>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if body["password"] == json!(state.login_password) {
        let access = state.accept_token.lock().unwrap().clone();
        Json(json!({
            "access": access,
            "refresh": "ref-1",
            "user": {
                "id": "u-1",
                "username": body["username"],
                "email": "amara@example.edu",
                "role": "student",
            },
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "invalid credentials").into_response()
    }
}

async fn register(Json(body): Json<serde_json::Value>) -> Response {
    Json(json!({
        "id": "u-2",
        "username": body["username"],
        "email": body["email"],
        "role": body["role"],
    }))
    .into_response()
}

async fn logout(
    State(state): State<Arc<TestBackend>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);

    if state.fail_logout {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if body.get("refresh_token").is_none() {
        return (StatusCode::BAD_REQUEST, "missing refresh_token").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn update_me(
    State(state): State<Arc<TestBackend>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let expected = state.accept_token.lock().unwrap().clone();
    if bearer(&headers) != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "credential expired").into_response();
    }

    Json(json!({
        "id": "u-1",
        "username": body.get("username").cloned().unwrap_or(json!("amara")),
        "email": body.get("email").cloned().unwrap_or(json!("amara@example.edu")),
        "role": "student",
        "first_name": body.get("first_name").cloned().unwrap_or(serde_json::Value::Null),
    }))
    .into_response()
}

/// Bind the backend on a loopback port and return its base URL
pub async fn spawn_backend(state: Arc<TestBackend>) -> String {
    let app = Router::new()
        .route("/auth/me/", get(me).patch(update_me))
        .route("/auth/token/refresh/", post(refresh))
        .route("/auth/login/", post(login))
        .route("/auth/register/", post(register))
        .route("/auth/logout/", post(logout))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Client with short timeouts pointed at the mock backend
pub fn client_for(base_url: &str, store: SessionStore) -> ApiClient {
    let config = ApiClientConfig::new(base_url)
        .with_timeout(5)
        .with_refresh_timeout(1);
    ApiClient::new(config, store).unwrap()
}
