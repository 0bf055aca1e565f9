use axum::{
    extract::State,
    response::{ErrorResponse, IntoResponse},
    Json,
};
use contest_pro_core::PaymentIntentPayload;
use log::debug;
use std::sync::Arc;

use crate::startup::AppState;

pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PaymentIntentPayload>,
) -> Result<impl IntoResponse, ErrorResponse> {
    debug!("payment intent requested for price {}", body.price);
    let response = state.organizer.create_payment_intent(body.price).await?;
    Ok(Json(response))
}
