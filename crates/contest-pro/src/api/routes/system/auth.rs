use axum::{extract::State, response::ErrorResponse, Json};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{domain, infra::tokens::TokenRequest, startup::AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Signs an access token for whoever the identity provider on the client side authenticated
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ErrorResponse> {
    debug!("issuing token for {}", body.email);
    let token = state.tokens.issue(body).map_err(|e| {
        error!("failed to sign token: {}", e);
        ErrorResponse::from(domain::Error::Token(e))
    })?;
    Ok(Json(TokenResponse { token }))
}
