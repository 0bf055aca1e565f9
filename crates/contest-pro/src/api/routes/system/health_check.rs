use axum::{extract::State, http::StatusCode, response::IntoResponse};
use log::error;
use std::sync::Arc;

use crate::startup::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.users_info.ping().await {
        error!("users db unreachable: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "users db unreachable");
    }
    if let Err(e) = state.organizer.ping().await {
        error!("contests db unreachable: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "contests db unreachable");
    }
    (StatusCode::OK, "OK")
}
