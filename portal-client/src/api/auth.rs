//! Auth endpoints
//!
//! Typed calls for the backend authentication contract. Login establishes
//! the session, logout clears it; everything in between rides the
//! credential pipeline like any other request.

use super::ApiClient;
use crate::session::{SessionStore, UserUpdate};
use portal_core::{PortalResult, Role, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Registration payload for a new portal account
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub role: Role,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: UserProfile,
}

#[derive(Serialize)]
struct LogoutRequest {
    refresh_token: String,
}

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

/// Authentication service over the credential pipeline
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The underlying API client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The session store backing this service
    pub fn store(&self) -> &SessionStore {
        self.client.store()
    }

    /// Log in and establish the session from the returned credentials
    pub async fn login(&self, username: &str, password: &str) -> PortalResult<UserProfile> {
        let response: LoginResponse = self
            .client
            .post("/auth/login/", &LoginRequest { username, password })
            .await?;

        self.store()
            .establish(response.user.clone(), response.access, response.refresh)
            .await;

        info!(username, role = %response.user.role, "Logged in");
        Ok(response.user)
    }

    /// Register a new account. Does not establish a session; the caller
    /// logs in separately.
    pub async fn register(&self, account: &NewAccount) -> PortalResult<UserProfile> {
        let created: UserProfile = self.client.post("/auth/register/", account).await?;

        info!(username = %created.username, role = %created.role, "Registered account");
        Ok(created)
    }

    /// Log out: revoke the refresh credential on the backend and clear the
    /// local session. The local session clears even when the backend call
    /// fails.
    pub async fn logout(&self) -> PortalResult<()> {
        let session = self.store().current().await;

        if let Some(refresh_token) = session.refresh_token {
            let result = self
                .client
                .post_no_content("/auth/logout/", &LogoutRequest { refresh_token })
                .await;
            if let Err(e) = result {
                warn!("Backend logout failed, clearing local session anyway: {}", e);
            }
        }

        self.store().clear().await;
        info!("Logged out");
        Ok(())
    }

    /// Fetch the current user profile from the backend
    pub async fn current_user(&self) -> PortalResult<UserProfile> {
        self.client.get("/auth/me/").await
    }

    /// Update the profile on the backend and merge the result into the
    /// session
    pub async fn update_profile(&self, update: &UserUpdate) -> PortalResult<UserProfile> {
        let updated: UserProfile = self.client.patch("/auth/me/", update).await?;

        self.store()
            .update_user(UserUpdate {
                username: Some(updated.username.clone()),
                email: Some(updated.email.clone()),
                first_name: updated.first_name.clone(),
                last_name: updated.last_name.clone(),
            })
            .await?;

        Ok(updated)
    }

    /// Change the account password
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> PortalResult<()> {
        self.client
            .post_no_content(
                "/auth/change-password/",
                &ChangePasswordRequest {
                    old_password,
                    new_password,
                },
            )
            .await
    }
}
