use contest_pro::{PaymentError, PaymentIntentRequest};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::helpers::{spawn_app, spawn_app_with_mock_gateway, MockStripeGateway};

#[tokio::test]
async fn test_payment_intent_charges_minor_units() {
    let (app, gateway) = spawn_app_with_mock_gateway().await;

    let response = app
        .post("/create-payment-intent", None, json!({ "price": 10 }))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["clientSecret"]
        .as_str()
        .unwrap()
        .starts_with("pi_mock_"));
    assert_eq!(
        gateway.requests(),
        vec![PaymentIntentRequest::card(1000, "usd")]
    );
}

#[tokio::test]
async fn test_rejected_payment_intent_is_bad_gateway() {
    let mut gateway = MockStripeGateway::new();
    gateway.expect_create_payment_intent().returning(|_| {
        Err(PaymentError::Rejected {
            status: StatusCode::PAYMENT_REQUIRED,
            message: String::from("card_declined"),
        })
    });
    let app = spawn_app(Arc::new(gateway)).await;

    let response = app
        .post("/create-payment-intent", None, json!({ "price": 12.5 }))
        .await;

    assert_eq!(response.status(), 502);
}
