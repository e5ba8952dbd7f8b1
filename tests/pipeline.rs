mod common;

use httpmock::prelude::*;
use marketplace_client::{ApiError, ClientConfig, ErrorMessages, TokenStore};
use serde::Deserialize;
use serde_json::{Value, json};

use common::{client_with_tokens, config_for};

#[derive(Debug, Deserialize)]
struct Summary {
    total: u32,
}

#[tokio::test]
async fn attaches_stored_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/bookings")
                .header("Authorization", "Bearer abc")
                .header("Accept", "application/json");
            then.status(200).json_body(json!({"items": []}));
        })
        .await;
    let (client, _) = client_with_tokens(&server, Some("abc"), Some("r1"));

    let body: Value = client.get("/bookings").call().await.unwrap();

    assert_eq!(body, json!({"items": []}));
    mock.assert_async().await;
}

#[tokio::test]
async fn omits_authorization_without_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/workers")
                .header_missing("Authorization");
            then.status(200).json_body(json!({"items": []}));
        })
        .await;
    let (client, _) = client_with_tokens(&server, None, None);

    let _: Value = client.get("workers").call().await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn sends_body_query_and_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/admin/reports")
                .query_param("range", "30")
                .header("X-Request-Source", "dashboard")
                .json_body(json!({"kind": "revenue"}));
            then.status(201).json_body(json!({"total": 12}));
        })
        .await;
    let (client, _) = client_with_tokens(&server, Some("abc"), None);

    let summary: Summary = client
        .post("/admin/reports")
        .query("range", 30)
        .header("X-Request-Source", "dashboard")
        .json(&json!({"kind": "revenue"}))
        .call()
        .await
        .unwrap();

    assert_eq!(summary.total, 12);
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/reviews/r1");
            then.status(204);
        })
        .await;
    let (client, _) = client_with_tokens(&server, Some("abc"), None);

    client.delete::<()>("/reviews/r1").call().await.unwrap();
    let nothing: Option<Summary> = client.delete("/reviews/r1").call().await.unwrap();

    assert!(nothing.is_none());
}

#[tokio::test]
async fn server_message_is_surfaced() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/bookings/b404");
            then.status(404)
                .json_body(json!({"message": "Booking not found"}));
        })
        .await;
    let (client, _) = client_with_tokens(&server, Some("abc"), Some("r1"));

    let error = client
        .get::<Value>("/bookings/b404")
        .call()
        .await
        .unwrap_err();

    assert_eq!(error.message(), "Booking not found");
    assert_eq!(error.status(), Some(404));
    assert_eq!(
        error.payload(),
        Some(&json!({"message": "Booking not found"}))
    );
    assert!(!error.is_network_error());
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn server_error_uses_configured_message_and_is_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/workers");
            then.status(500);
        })
        .await;
    let config = ClientConfig {
        error_messages: ErrorMessages {
            server_error: "The marketplace is having trouble.".to_string(),
            ..ErrorMessages::default()
        },
        ..config_for(&server)
    };
    let client = marketplace_client::ApiClient::new(config).unwrap();

    let error = client.get::<Value>("/workers").call().await.unwrap_err();

    assert!(matches!(error, ApiError::Server { status: 500, .. }));
    assert_eq!(error.message(), "The marketplace is having trouble.");
    assert_eq!(error.payload(), None);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn forbidden_does_not_touch_the_session() {
    let server = MockServer::start_async().await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token");
            then.status(200).json_body(json!({"token": "new"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/users");
            then.status(403);
        })
        .await;
    let (client, store) = client_with_tokens(&server, Some("abc"), Some("r1"));

    let error = client.get::<Value>("/admin/users").call().await.unwrap_err();

    assert!(matches!(error, ApiError::Client { status: 403, .. }));
    assert_eq!(error.message(), ErrorMessages::default().forbidden);
    assert_eq!(store.access_token().as_deref(), Some("abc"));
    refresh.assert_hits_async(0).await;
}

#[tokio::test]
async fn mismatched_body_is_a_parse_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/summary");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;
    let (client, _) = client_with_tokens(&server, None, None);

    let error = client.get::<Summary>("/summary").call().await.unwrap_err();

    assert!(matches!(error, ApiError::ParseError(_)));
}

#[tokio::test]
async fn invalid_header_is_rejected_before_sending() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path("/bookings");
            then.status(200);
        })
        .await;
    let (client, _) = client_with_tokens(&server, None, None);

    let error = client
        .get::<()>("/bookings")
        .header("bad header", "x")
        .call()
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Validation(_)));
    mock.assert_hits_async(0).await;
}
