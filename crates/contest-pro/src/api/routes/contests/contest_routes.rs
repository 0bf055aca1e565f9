use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{ErrorResponse, IntoResponse},
    Json,
};
use contest_pro_core::MessageResponse;
use log::error;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::extractors::{AdminAuth, AuthError, JwtAuth},
    domain::{ContestsQuery, NewContest},
    startup::AppState,
};

pub async fn get_contests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContestsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match state.organizer.list_contests(query.into()).await {
        Ok(contests) => Ok(Json(contests)),
        Err(e) => {
            error!("failed to list contests: {}", e);
            Err(ErrorResponse::from(e))
        }
    }
}

pub async fn get_contest(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let contest = state.organizer.get_contest(id).await?;
    Ok(Json(contest))
}

pub async fn create_contest(
    JwtAuth { email, .. }: JwtAuth,
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewContest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match state.organizer.create_contest(&email, body).await {
        Ok(inserted) => Ok(Json(inserted)),
        Err(e) => {
            error!("failed to create contest: {}", e);
            Err(ErrorResponse::from(e))
        }
    }
}

pub async fn approve_contest(
    AdminAuth(_): AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if state.organizer.approve_contest(id).await? {
        Ok((
            StatusCode::OK,
            Json(MessageResponse::new("Contest approved successfully")),
        ))
    } else {
        Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("Failed to approve contest")),
        ))
    }
}

pub async fn delete_contest(
    JwtAuth { email, .. }: JwtAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let caller = state
        .users_info
        .caller(&email)
        .await
        .map_err(AuthError::Lookup)?;
    let result = state.organizer.delete_contest(&caller, id).await?;
    Ok(Json(result))
}
