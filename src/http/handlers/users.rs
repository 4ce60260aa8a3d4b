//! Registration and user administration.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{Principal, PrincipalId, Role, RoleCode};
use crate::error::ApiError;
use crate::http::server::AppState;
use crate::models::{NewUser, RoleAssignment};
use crate::validation::ValidatedJson;

/// Open registration. New users start as clients.
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewUser>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let principal = Principal {
        id: PrincipalId::new(Uuid::new_v4().to_string()),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        role: Some(Role::from(RoleCode::Client)),
        created_at: Utc::now(),
    };
    state.principals.insert(principal.clone()).await?;
    tracing::info!(principal = %principal.id, "User registered");
    Ok((StatusCode::CREATED, Json(principal)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Principal>>, ApiError> {
    Ok(Json(state.principals.list().await?))
}

pub async fn current_user(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

pub async fn assign_role(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<String>,
    Json(assignment): Json<RoleAssignment>,
) -> Result<Json<Principal>, ApiError> {
    let id = PrincipalId::new(id);
    let updated = state
        .principals
        .set_role(&id, Role::from(assignment.role))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;
    tracing::info!(principal = %id, role = %assignment.role, by = %admin.id, "Role assigned");
    Ok(Json(updated))
}
