use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hyper::header::AUTHORIZATION;
use log::{debug, error};
use serde_json::json;
use std::sync::Arc;

use crate::{
    domain::{self, Caller},
    infra::tokens::Claims,
    startup::AppState,
};

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    Forbidden,
    Lookup(domain::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "unauthorized access" })),
            )
                .into_response(),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "forbidden access" })),
            )
                .into_response(),
            AuthError::Lookup(e) => {
                error!("failed to look up caller: {}", e);
                e.into_response()
            }
        }
    }
}

/// Caller identified by a valid `Authorization: Bearer <token>` header
#[derive(Debug, Clone)]
pub struct JwtAuth {
    pub email: String,
    pub claims: Claims,
}

impl FromRequestParts<Arc<AppState>> for JwtAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?;

        // The scheme is not checked, the token is whatever follows the first space
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.split_whitespace().nth(1))
            .ok_or(AuthError::InvalidToken)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            debug!("rejected token: {}", e);
            AuthError::InvalidToken
        })?;

        Ok(JwtAuth {
            email: claims.email.clone(),
            claims,
        })
    }
}

/// Caller holding a valid token whose stored role is admin
#[derive(Debug, Clone)]
pub struct AdminAuth(pub Caller);

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth { email, .. } = JwtAuth::from_request_parts(parts, state).await?;

        match state.users_info.require_admin(&email).await {
            Ok(caller) => Ok(AdminAuth(caller)),
            Err(domain::Error::Forbidden) => Err(AuthError::Forbidden),
            Err(e) => Err(AuthError::Lookup(e)),
        }
    }
}
