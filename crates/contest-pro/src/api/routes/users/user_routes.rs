use axum::{
    extract::{Path, Query, State},
    response::{ErrorResponse, IntoResponse, Response},
    Json,
};
use contest_pro_core::parse_role;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::extractors::{AdminAuth, AuthError, JwtAuth},
    domain::{self, NewUser},
    startup::AppState,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersQuery {
    pub profile: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleQuery {
    pub role: Option<String>,
}

/// Lists every user for admins, or looks up one profile by `profile`/`email`.
/// A profile lookup is open to the profile owner as well.
pub async fn get_users(
    JwtAuth { email, .. }: JwtAuth,
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsersQuery>,
) -> Result<Response, ErrorResponse> {
    let target = query
        .profile
        .filter(|p| !p.is_empty())
        .or(query.email.filter(|e| !e.is_empty()));
    let caller = state
        .users_info
        .caller(&email)
        .await
        .map_err(AuthError::Lookup)?;

    match target {
        Some(target) => {
            if target != caller.email && !caller.is_admin() {
                return Err(ErrorResponse::from(AuthError::Forbidden));
            }
            debug!("profile lookup for {} by {}", target, caller.email);
            let user = state.users_info.get_by_email(&target).await?;
            Ok(Json(user).into_response())
        }
        None => {
            if !caller.is_admin() {
                return Err(ErrorResponse::from(AuthError::Forbidden));
            }
            let users = state.users_info.list().await?;
            Ok(Json(users).into_response())
        }
    }
}

pub async fn get_user_role(
    JwtAuth { email, .. }: JwtAuth,
    State(state): State<Arc<AppState>>,
    Path(requested): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if requested != email {
        return Err(ErrorResponse::from(AuthError::Forbidden));
    }
    let role = state.users_info.role_of(&requested).await?;
    Ok(Json(role))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match state.users_info.register(body).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("failed to register user: {}", e);
            Err(ErrorResponse::from(e))
        }
    }
}

pub async fn delete_user(
    AdminAuth(admin): AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    info!("{} deleting user {}", admin.email, id);
    let result = state.users_info.delete_user(id).await?;
    Ok(Json(result))
}

pub async fn update_user_role(
    AdminAuth(admin): AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let role = parse_role(query.role.as_deref()).map_err(domain::Error::from)?;
    info!("{} setting role of user {} to {}", admin.email, id, role);
    let result = state.users_info.set_role(id, role).await?;
    Ok(Json(result))
}
