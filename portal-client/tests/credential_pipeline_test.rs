//! Credential pipeline integration tests
//!
//! Drives the attach / refresh / replay protocol against a loopback backend:
//! single-replay discipline, refresh coalescing, rotation handling, and the
//! forced-logout signal on refresh failure.

mod common;

use common::{client_for, sample_profile, spawn_backend, RefreshBehavior, TestBackend};
use portal_client::{SessionEvent, SessionStore};
use portal_core::{PortalError, Role, UserProfile};
use std::sync::Arc;
use std::time::Duration;

async fn established_store(access: &str, refresh: &str) -> SessionStore {
    let store = SessionStore::in_memory();
    store
        .establish(
            sample_profile(Role::Student),
            access.to_string(),
            refresh.to_string(),
        )
        .await;
    store
}

#[tokio::test]
async fn request_with_valid_credential_passes_through() {
    let backend = Arc::new(TestBackend::accepting("acc-1"));
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("acc-1", "ref-1").await;
    let client = client_for(&base_url, store);

    let profile: UserProfile = client.get("/auth/me/").await.unwrap();
    assert_eq!(profile.username, "amara");
    assert_eq!(backend.me_hits(), 1);
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn expired_credential_is_refreshed_and_replayed_once() {
    let backend = Arc::new(TestBackend {
        refresh: RefreshBehavior::Grant {
            access: "acc-2".to_string(),
            rotated_refresh: None,
            delay: Duration::ZERO,
        },
        ..TestBackend::accepting("acc-2")
    });
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("stale", "ref-1").await;
    let client = client_for(&base_url, store.clone());

    // Original dispatch 401s, the replay carries the refreshed bearer and
    // succeeds; the caller sees only the success.
    let profile: UserProfile = client.get("/auth/me/").await.unwrap();
    assert_eq!(profile.id, "u-1");

    assert_eq!(backend.me_hits(), 2);
    assert_eq!(backend.refresh_calls(), 1);

    let session = store.current().await;
    assert_eq!(session.access_token.as_deref(), Some("acc-2"));
    // No rotation in the refresh response: the old refresh token stays.
    assert_eq!(session.refresh_token.as_deref(), Some("ref-1"));
    assert!(session.is_authenticated);
}

#[tokio::test]
async fn rotated_refresh_credential_replaces_the_stored_one() {
    let backend = Arc::new(TestBackend {
        refresh: RefreshBehavior::Grant {
            access: "acc-2".to_string(),
            rotated_refresh: Some("ref-2".to_string()),
            delay: Duration::ZERO,
        },
        ..TestBackend::accepting("acc-2")
    });
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("stale", "ref-1").await;
    let client = client_for(&base_url, store.clone());

    let _: UserProfile = client.get("/auth/me/").await.unwrap();

    assert_eq!(
        store.current().await.refresh_token.as_deref(),
        Some("ref-2")
    );
}

#[tokio::test]
async fn second_401_terminates_without_a_third_attempt() {
    // The backend accepts a token the client never obtains, so both the
    // original dispatch and the replay are rejected.
    let backend = Arc::new(TestBackend {
        refresh: RefreshBehavior::Grant {
            access: "still-wrong".to_string(),
            rotated_refresh: None,
            delay: Duration::ZERO,
        },
        ..TestBackend::accepting("unreachable")
    });
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("stale", "ref-1").await;
    let client = client_for(&base_url, store);

    let err = client.get::<UserProfile>("/auth/me/").await.unwrap_err();
    assert!(matches!(err, PortalError::Unauthorized { .. }));

    assert_eq!(backend.me_hits(), 2);
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn refresh_failure_forces_logout_and_fails_the_caller() {
    let backend = Arc::new(TestBackend {
        refresh: RefreshBehavior::Reject,
        ..TestBackend::accepting("unreachable")
    });
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("stale", "ref-1").await;
    let mut events = store.subscribe();
    let client = client_for(&base_url, store.clone());

    let err = client.get::<UserProfile>("/auth/me/").await.unwrap_err();
    // The caller receives the original authorization error, not the
    // refresh exchange's.
    assert!(matches!(err, PortalError::Unauthorized { .. }));

    assert!(!store.current().await.is_authenticated);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
    assert_eq!(backend.me_hits(), 1);
}

#[tokio::test]
async fn hung_refresh_resolves_to_failure_within_the_bound() {
    let backend = Arc::new(TestBackend {
        refresh: RefreshBehavior::Hang,
        ..TestBackend::accepting("unreachable")
    });
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("stale", "ref-1").await;
    let client = client_for(&base_url, store.clone());

    let started = std::time::Instant::now();
    let err = client.get::<UserProfile>("/auth/me/").await.unwrap_err();
    assert!(matches!(err, PortalError::Unauthorized { .. }));

    // The 1s refresh bound, not the hung exchange, decides how long this
    // takes.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!store.current().await.is_authenticated);
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh_exchange() {
    let backend = Arc::new(TestBackend {
        refresh: RefreshBehavior::Grant {
            access: "acc-2".to_string(),
            rotated_refresh: None,
            // Widen the race window so every request is already waiting on
            // the gate while the exchange runs.
            delay: Duration::from_millis(100),
        },
        ..TestBackend::accepting("acc-2")
    });
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("stale", "ref-1").await;
    let client = client_for(&base_url, store);

    let requests = (0..5).map(|_| {
        let client = client.clone();
        async move { client.get::<UserProfile>("/auth/me/").await }
    });
    let results = futures::future::join_all(requests).await;

    for result in results {
        assert!(result.is_ok());
    }
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn unauthenticated_401_skips_refresh_and_propagates() {
    let backend = Arc::new(TestBackend::accepting("unreachable"));
    let base_url = spawn_backend(backend.clone()).await;

    // Empty store: e.g. a wrong-password login attempt.
    let store = SessionStore::in_memory();
    let client = client_for(&base_url, store);

    let err = client.get::<UserProfile>("/auth/me/").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn non_authorization_errors_pass_through_untouched() {
    let backend = Arc::new(TestBackend::accepting("acc-1"));
    let base_url = spawn_backend(backend.clone()).await;

    let store = established_store("acc-1", "ref-1").await;
    let client = client_for(&base_url, store);

    let err = client
        .get::<UserProfile>("/no/such/endpoint/")
        .await
        .unwrap_err();
    match err {
        PortalError::Api { status, .. } => assert_eq!(status, 404),
        other => panic!("expected passthrough Api error, got {:?}", other.status()),
    }
    assert_eq!(backend.refresh_calls(), 0);
}
