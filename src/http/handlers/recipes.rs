//! Recipe browsing and authoring.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::http::server::AppState;
use crate::models::{NewRecipe, Recipe};
use crate::validation::ValidatedJson;

/// Newest first.
pub async fn list_recipes(State(state): State<AppState>) -> Json<Vec<Recipe>> {
    let mut recipes = state.recipes.all();
    recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(recipes)
}

pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, ApiError> {
    state
        .recipes
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(author): Extension<Principal>,
    ValidatedJson(payload): ValidatedJson<NewRecipe>,
) -> (StatusCode, Json<Recipe>) {
    let recipe = payload.into_recipe(author.id);
    tracing::info!(recipe_id = %recipe.id, author = %recipe.author_id, "Recipe created");
    state.recipes.insert(recipe.id, recipe.clone());
    (StatusCode::CREATED, Json(recipe))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(moderator): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.recipes.remove(&id) {
        Some(_) => {
            tracing::info!(recipe_id = %id, by = %moderator.id, "Recipe deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(format!("Recipe {id} not found"))),
    }
}
