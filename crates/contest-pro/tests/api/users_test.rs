use serde_json::{json, Value};

use crate::helpers::spawn_app_with_mock_gateway;

#[tokio::test]
async fn test_register_twice_reports_existing_user() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let first = app.register("alice@example.com", "Alice").await;
    assert_eq!(first["acknowledged"], json!(true));
    assert!(first["insertedId"].is_string());

    let second = app.register("alice@example.com", "Alice Again").await;
    assert_eq!(
        second,
        json!({ "message": "User already exists", "insertedId": null })
    );
}

#[tokio::test]
async fn test_register_ignores_client_role() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    app.post(
        "/users",
        None,
        json!({ "email": "mallory@example.com", "role": "admin" }),
    )
    .await;
    let token = app.token_for("mallory@example.com").await;

    let response = app.get("/users/role/mallory@example.com", Some(&token)).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_user_listing_requires_token() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app.get("/users", None).await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "unauthorized access" }));

    let response = app.get("/users", Some("not-a-token")).await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_user_listing_is_admin_only() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let user = app.user_token("bob@example.com").await;
    let admin = app.admin_token("root@example.com").await;

    let response = app.get("/users", Some(&user)).await;
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "forbidden access" }));

    let response = app.get("/users", Some(&admin)).await;
    assert_eq!(response.status(), 200);
    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["email"], "bob@example.com");
}

#[tokio::test]
async fn test_profile_lookup_is_open_to_its_owner() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let bob = app.user_token("bob@example.com").await;
    app.register("carol@example.com", "Carol").await;

    let response = app.get("/users?profile=bob@example.com", Some(&bob)).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "bob@example.com");
    assert_eq!(body["role"], "user");

    let response = app.get("/users?profile=carol@example.com", Some(&bob)).await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_role_lookup_for_someone_else_is_forbidden() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let bob = app.user_token("bob@example.com").await;

    let response = app.get("/users/role/carol@example.com", Some(&bob)).await;

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_admin_changes_role_then_deletes_user() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let admin = app.admin_token("root@example.com").await;
    let registered = app.register("bob@example.com", "Bob").await;
    let id = registered["insertedId"].as_str().unwrap().to_string();

    let response = app
        .patch(&format!("/users/{}?role=admin", id), &admin)
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["matchedCount"], 1);
    assert_eq!(body["modifiedCount"], 1);

    let response = app.patch(&format!("/users/{}?role=owner", id), &admin).await;
    assert_eq!(response.status(), 400);

    let response = app.delete(&format!("/users/{}", id), &admin).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deletedCount"], 1);
}

#[tokio::test]
async fn test_role_change_requires_admin() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let bob = app.user_token("bob@example.com").await;
    let registered = app.register("carol@example.com", "Carol").await;
    let id = registered["insertedId"].as_str().unwrap().to_string();

    let response = app.patch(&format!("/users/{}?role=admin", id), &bob).await;

    assert_eq!(response.status(), 403);
}
