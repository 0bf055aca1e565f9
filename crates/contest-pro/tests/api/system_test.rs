use contest_pro::TokenIssuer;
use serde_json::{json, Value};
use std::time::Duration;

use crate::helpers::{spawn_app_with_mock_gateway, TEST_SECRET};

#[tokio::test]
async fn test_root_reports_running() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app.get("/", None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Contest Pro is running!");
}

#[tokio::test]
async fn test_health_check_is_ok() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app.get("/api/v1/health_check", None).await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_issued_token_carries_extra_claims() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app
        .post(
            "/jwt",
            None,
            json!({ "email": "alice@example.com", "name": "Alice" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let claims = TokenIssuer::new(TEST_SECRET, Duration::from_secs(3600))
        .verify(token)
        .unwrap();
    assert_eq!(claims.email, "alice@example.com");
    assert_eq!(claims.extra.get("name"), Some(&json!("Alice")));
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_token_request_without_email_is_rejected() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app.post("/jwt", None, json!({ "name": "Alice" })).await;

    assert!(response.status().is_client_error());
}
