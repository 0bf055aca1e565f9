use serde_json::{json, Value};

use crate::helpers::{spawn_app_with_mock_gateway, TestApp};

async fn enter(app: &TestApp, token: &str, contest_id: &str) -> String {
    let response = app
        .post(
            "/participants",
            Some(token),
            json!({
                "contest_id": contest_id,
                "participant_name": "Entrant",
                "transaction_id": "pi_test",
                "submission": "https://example.com/entry",
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body["insertedId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_listing_without_query_is_rejected() {
    let (app, _) = spawn_app_with_mock_gateway().await;

    let response = app.get("/participants", None).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please provide a valid query");
}

#[tokio::test]
async fn test_entry_for_unknown_contest_is_rejected() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let alice = app.user_token("alice@example.com").await;

    let response = app
        .post(
            "/participants",
            Some(&alice),
            json!({ "contest_id": "0190b5a2-3c4d-7e5f-8a9b-0c1d2e3f4a5b" }),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .post("/participants", Some(&alice), json!({ "contest_id": "abc" }))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_entry_details_come_from_token_and_contest() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let alice = app.user_token("alice@example.com").await;
    let contest = app.create_contest(&creator, "Best Review", "Book Review").await;

    let response = app
        .post(
            "/participants",
            Some(&alice),
            json!({
                "contest_id": contest,
                "contest_title": "Something Else",
                "creator_email": "alice@example.com",
                "participant_email": "someone@else.com",
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get("/myParticipations?email=alice@example.com", None).await;
    let entries: Vec<Value> = response.json().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["participant_email"], "alice@example.com");
    assert_eq!(entries[0]["creator_email"], "creator@example.com");
    assert_eq!(entries[0]["contest_title"], "Best Review");
    assert_eq!(entries[0]["contest_prize"], "500");
    assert_eq!(entries[0]["isWinner"], false);

    let response = app.get("/myParticipations?email=someone@else.com", None).await;
    let entries: Vec<Value> = response.json().await.unwrap();
    assert!(entries.is_empty());

    let response = app.get("/myParticipations", None).await;
    let entries: Vec<Value> = response.json().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_participant_cannot_crown_themselves() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let mallory = app.user_token("mallory@example.com").await;
    let contest = app.create_contest(&creator, "Best Review", "Book Review").await;

    let response = app
        .post(
            "/participants",
            Some(&mallory),
            json!({
                "contest_id": contest,
                "contest_title": "Best Review",
                "creator_email": "mallory@example.com",
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let entry = body["insertedId"].as_str().unwrap().to_string();

    let response = app.patch(&format!("/participants/{}", entry), &mallory).await;
    assert_eq!(response.status(), 403);

    let response = app
        .get("/participants?participant=mallory@example.com&winner=true", None)
        .await;
    let wins: Vec<Value> = response.json().await.unwrap();
    assert!(wins.is_empty());

    let response = app
        .get("/participants?creator=mallory@example.com", None)
        .await;
    let summaries: Vec<Value> = response.json().await.unwrap();
    assert!(summaries.is_empty());

    let response = app.patch(&format!("/participants/{}", entry), &creator).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_contest_title_param_lists_by_participant() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let alice = app.user_token("alice@example.com").await;
    let bob = app.user_token("bob@example.com").await;
    let contest = app.create_contest(&creator, "Best Review", "Book Review").await;
    let entry = enter(&app, &alice, &contest).await;
    enter(&app, &bob, &contest).await;

    let response = app
        .get("/participants?contest_title=alice@example.com", None)
        .await;
    assert_eq!(response.status(), 200);
    let entries: Vec<Value> = response.json().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["_id"], entry.as_str());

    let response = app.get("/participants?contest_title=Best%20Review", None).await;
    let entries: Vec<Value> = response.json().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_creator_sees_one_summary_per_contest() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let other = app.user_token("other@example.com").await;
    let alice = app.user_token("alice@example.com").await;
    let bob = app.user_token("bob@example.com").await;
    let review = app.create_contest(&creator, "Best Review", "Book Review").await;
    let story = app.create_contest(&creator, "Short Story", "Others").await;
    let elsewhere = app.create_contest(&other, "Elsewhere", "Book Review").await;
    enter(&app, &alice, &review).await;
    enter(&app, &bob, &review).await;
    enter(&app, &bob, &story).await;
    enter(&app, &bob, &elsewhere).await;

    let response = app
        .get("/participants?creator=creator@example.com", None)
        .await;
    assert_eq!(response.status(), 200);
    let summaries: Vec<Value> = response.json().await.unwrap();

    let mut titles: Vec<&str> = summaries
        .iter()
        .map(|s| s["contest_title"].as_str().unwrap())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Best Review", "Short Story"]);
    assert!(summaries.iter().all(|s| s["_id"] == s["contest_title"]));
}

#[tokio::test]
async fn test_winner_is_declared_once_per_contest() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let creator = app.user_token("creator@example.com").await;
    let alice = app.user_token("alice@example.com").await;
    let bob = app.user_token("bob@example.com").await;
    let contest = app.create_contest(&creator, "Best Review", "Book Review").await;
    let first = enter(&app, &alice, &contest).await;
    let second = enter(&app, &bob, &contest).await;

    let response = app.patch(&format!("/participants/{}", first), &bob).await;
    assert_eq!(response.status(), 403);

    let response = app.patch(&format!("/participants/{}", first), &creator).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["modifiedCount"], 1);

    let response = app.patch(&format!("/participants/{}", second), &creator).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "message": "A winner has already been declared for this contest" })
    );

    let response = app
        .get("/participants?participant=alice@example.com&winner=true", None)
        .await;
    let wins: Vec<Value> = response.json().await.unwrap();
    assert_eq!(wins.len(), 1);
    assert_eq!(wins[0]["isWinner"], true);

    let response = app
        .get("/participants?participant=bob@example.com&winner=true", None)
        .await;
    let wins: Vec<Value> = response.json().await.unwrap();
    assert!(wins.is_empty());
}

#[tokio::test]
async fn test_stats_count_entries_and_winners() {
    let (app, _) = spawn_app_with_mock_gateway().await;
    let admin = app.admin_token("root@example.com").await;
    let creator = app.user_token("creator@example.com").await;
    let alice = app.user_token("alice@example.com").await;
    let review = app.create_contest(&creator, "Best Review", "Book Review").await;
    let story = app.create_contest(&creator, "Short Story", "Others").await;
    let first = enter(&app, &alice, &review).await;
    enter(&app, &alice, &story).await;

    app.patch(&format!("/participants/{}", first), &admin).await;

    let response = app.get("/participants/stats", Some(&alice)).await;
    assert_eq!(response.status(), 403);

    let response = app.get("/participants/stats", Some(&admin)).await;
    assert_eq!(response.status(), 200);
    let stats: Value = response.json().await.unwrap();
    assert_eq!(stats["totalParticipants"], 2);
    assert_eq!(stats["totalWinners"], 1);
    assert_eq!(stats["winners"][0]["_id"], first.as_str());
}
