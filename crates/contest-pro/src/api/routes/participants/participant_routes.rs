use axum::{
    extract::{Path, Query, State},
    response::{ErrorResponse, IntoResponse},
    Json,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::extractors::{AdminAuth, AuthError, JwtAuth},
    domain::{NewParticipation, ParticipantsQuery, ParticipationQuery},
    startup::AppState,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MyParticipationsQuery {
    pub email: Option<String>,
}

pub async fn get_participants(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ParticipantsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let query = ParticipationQuery::try_from(query)?;
    debug!("participation listing: {:?}", query);
    let listing = state.organizer.list_participations(query).await?;
    Ok(Json(listing))
}

pub async fn get_participant_stats(
    AdminAuth(_): AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let stats = state.organizer.participation_stats().await?;
    Ok(Json(stats))
}

pub async fn add_participant(
    JwtAuth { email, .. }: JwtAuth,
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewParticipation>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match state.organizer.add_participation(&email, body).await {
        Ok(inserted) => Ok(Json(inserted)),
        Err(e) => {
            error!("failed to add participation: {}", e);
            Err(ErrorResponse::from(e))
        }
    }
}

pub async fn declare_winner(
    JwtAuth { email, .. }: JwtAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let caller = state
        .users_info
        .caller(&email)
        .await
        .map_err(AuthError::Lookup)?;
    let result = state.organizer.declare_winner(&caller, id).await?;
    Ok(Json(result))
}

/// Without an email nothing matches
pub async fn get_my_participations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MyParticipationsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let participations = match query.email.filter(|e| !e.is_empty()) {
        Some(email) => state.organizer.my_participations(&email).await?,
        None => vec![],
    };
    Ok(Json(participations))
}
