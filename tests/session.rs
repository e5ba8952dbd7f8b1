mod common;

use std::sync::Arc;

use httpmock::prelude::*;
use marketplace_client::{
    ACCESS_TOKEN_KEY, ApiClient, ApiError, FileTokenStore, REFRESH_TOKEN_KEY, SessionEvent,
    TokenStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use common::{client_with_tokens, config_for};

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct User {
    id: String,
    role: String,
}

#[tokio::test]
async fn login_stores_tokens_and_user() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .header_missing("Authorization")
                .json_body(json!({"identity": "ada@example.com", "password": "hunter2"}));
            then.status(200).json_body(json!({
                "token": "a1",
                "refreshToken": "r1",
                "user": {"id": "u1", "role": "customer"}
            }));
        })
        .await;
    let (client, store) = client_with_tokens(&server, Some("stale"), None);
    let mut events = client.subscribe();

    let auth = client.login(" ada@example.com ", "hunter2").await.unwrap();

    assert_eq!(auth.token, "a1");
    assert_eq!(store.access_token().as_deref(), Some("a1"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    assert!(client.is_authenticated());
    assert_eq!(
        client.current_user::<User>(),
        Some(User {
            id: "u1".to_string(),
            role: "customer".to_string()
        })
    );
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
    login.assert_async().await;
}

#[tokio::test]
async fn login_replaces_previous_session() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(json!({"token": "b-access"}));
        })
        .await;
    let (client, store) = client_with_tokens(&server, Some("a-access"), Some("a-refresh"));
    store.set_user(json!({"id": "user-a", "role": "customer"}));

    client.login("bob@example.com", "hunter2").await.unwrap();

    assert_eq!(store.access_token().as_deref(), Some("b-access"));
    assert_eq!(store.refresh_token(), None);
    assert_eq!(client.current_user::<User>(), None);
}

#[tokio::test]
async fn wrong_credentials_do_not_trigger_refresh() {
    let server = MockServer::start_async().await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token");
            then.status(200).json_body(json!({"token": "new"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(401)
                .json_body(json!({"message": "Invalid email or password"}));
        })
        .await;
    let (client, store) = client_with_tokens(&server, Some("a0"), Some("r0"));

    let error = client.login("ada@example.com", "nope").await.unwrap_err();

    assert!(error.is_authorization_error());
    assert_eq!(error.message(), "Invalid email or password");
    assert_eq!(store.access_token().as_deref(), Some("a0"));
    refresh.assert_hits_async(0).await;
}

#[tokio::test]
async fn blank_credentials_are_rejected_locally() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200);
        })
        .await;
    let (client, _) = client_with_tokens(&server, None, None);

    for (identity, password) in [("", "secret"), ("ada@example.com", ""), ("  ", "")] {
        let error = client.login(identity, password).await.unwrap_err();
        assert!(matches!(error, ApiError::Validation(_)));
    }

    login.assert_hits_async(0).await;
}

#[tokio::test]
async fn logout_clears_everything() {
    let server = MockServer::start_async().await;
    let (client, store) = client_with_tokens(&server, Some("a1"), Some("r1"));
    store.set_user(json!({"id": "u1", "role": "worker"}));
    let mut events = client.subscribe();

    client.logout();

    assert!(!client.is_authenticated());
    assert_eq!(store.refresh_token(), None);
    assert_eq!(client.current_user::<User>(), None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
}

#[tokio::test]
async fn file_store_persists_refreshed_tokens() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/bookings")
                .header("Authorization", "Bearer old");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token");
            then.status(200)
                .json_body(json!({"token": "new", "refreshToken": "new2"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/bookings")
                .header("Authorization", "Bearer new");
            then.status(200).json_body(json!({"items": []}));
        })
        .await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = Arc::new(FileTokenStore::open(&path).unwrap());
    store.set_tokens("old", Some("r1"));
    let client = ApiClient::with_token_store(config_for(&server), store).unwrap();

    let _: Value = client.get("/bookings").call().await.unwrap();

    let persisted: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(persisted[ACCESS_TOKEN_KEY], "new");
    assert_eq!(persisted[REFRESH_TOKEN_KEY], "new2");
}
