//! Per-user pantry items. Callers only ever see their own.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::http::server::AppState;
use crate::models::{NewPantryItem, PantryItem};
use crate::validation::ValidatedJson;

pub async fn list_pantry(
    State(state): State<AppState>,
    Extension(owner): Extension<Principal>,
) -> Json<Vec<PantryItem>> {
    let mut items = state.pantry.filter(|item| item.owner_id == owner.id);
    items.sort_by(|a, b| {
        // Items without an expiry date sort last.
        match (a.expires_on, b.expires_on) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    });
    Json(items)
}

pub async fn add_pantry_item(
    State(state): State<AppState>,
    Extension(owner): Extension<Principal>,
    ValidatedJson(payload): ValidatedJson<NewPantryItem>,
) -> (StatusCode, Json<PantryItem>) {
    let item = payload.into_item(owner.id);
    state.pantry.insert(item.id, item.clone());
    (StatusCode::CREATED, Json(item))
}

pub async fn remove_pantry_item(
    State(state): State<AppState>,
    Extension(owner): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .pantry
        .remove_if(&id, |item| item.owner_id == owner.id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::NotFound(format!("Pantry item {id} not found")))
}
