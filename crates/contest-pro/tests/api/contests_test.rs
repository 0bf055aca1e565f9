use serde_json::{json, Value};

use crate::helpers::spawn_app_with_mock_gateway;

async fn titles(response: reqwest::Response) -> Vec<String> {
    let contests: Vec<Value> = response.json().await.unwrap();
    contests
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_new_contest_is_hidden_until_approved() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let admin = app.admin_token("root@example.com").await;
    let id = app.create_contest(&creator, "Best Review", "Book Review").await;

    assert!(titles(app.get("/contests", None).await).await.is_empty());
    assert_eq!(
        titles(app.get("/contests?isPending=true", None).await).await,
        vec!["Best Review"]
    );

    let response = app.patch(&format!("/contests/approve/{}", id), &admin).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Contest approved successfully" }));

    assert_eq!(
        titles(app.get("/contests", None).await).await,
        vec!["Best Review"]
    );

    let response = app.patch(&format!("/contests/approve/{}", id), &admin).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Failed to approve contest" }));
}

#[tokio::test]
async fn test_creator_sees_own_contests_in_any_state() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let other = app.user_token("other@example.com").await;
    app.create_contest(&creator, "Mine", "Movie Review").await;
    app.create_contest(&other, "Theirs", "Movie Review").await;

    let response = app
        .get("/contests?email=creator@example.com", None)
        .await;

    assert_eq!(titles(response).await, vec!["Mine"]);
}

#[tokio::test]
async fn test_others_type_excludes_known_types() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    app.create_contest(&creator, "Essay", "Article Writing").await;
    app.create_contest(&creator, "Poem", "Poetry").await;

    let response = app
        .get("/contests?email=creator@example.com&contestType=Others", None)
        .await;

    assert_eq!(titles(response).await, vec!["Poem"]);
}

#[tokio::test]
async fn test_creator_is_taken_from_token() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;

    let response = app
        .post(
            "/contests",
            Some(&creator),
            json!({
                "title": "Spoofed",
                "contestType": "Book Review",
                "creator": { "email": "someone@else.com", "name": "Creator" },
                "tags": ["weekly"],
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let id = body["insertedId"].as_str().unwrap();

    let response = app.get(&format!("/contests/{}", id), None).await;
    assert_eq!(response.status(), 200);
    let contest: Value = response.json().await.unwrap();
    assert_eq!(contest["creator"]["email"], "creator@example.com");
    assert_eq!(contest["creator"]["name"], "Creator");
    assert_eq!(contest["isPending"], true);
    assert_eq!(contest["tags"], json!(["weekly"]));
}

#[tokio::test]
async fn test_create_contest_requires_token() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app
        .post("/contests", None, json!({ "title": "Anonymous" }))
        .await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_unknown_contest_is_not_found() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app
        .get("/contests/0190b5a2-3c4d-7e5f-8a9b-0c1d2e3f4a5b", None)
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_only_creator_or_admin_may_delete() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let other = app.user_token("other@example.com").await;
    let admin = app.admin_token("root@example.com").await;
    let first = app.create_contest(&creator, "First", "Book Review").await;
    let second = app.create_contest(&creator, "Second", "Book Review").await;

    let response = app.delete(&format!("/contests/{}", first), &other).await;
    assert_eq!(response.status(), 403);

    let response = app.delete(&format!("/contests/{}", first), &creator).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deletedCount"], 1);

    let response = app.delete(&format!("/contests/{}", second), &admin).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deletedCount"], 1);

    let response = app.delete(&format!("/contests/{}", second), &admin).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deletedCount"], 0);
}
