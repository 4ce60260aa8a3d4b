//! Marketplace products.

use axum::{extract::State, http::StatusCode, Json};

use crate::http::server::AppState;
use crate::models::{NewProduct, Product};
use crate::validation::ValidatedJson;

/// Sorted by name.
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    let mut products = state.products.all();
    products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Json(products)
}

pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewProduct>,
) -> (StatusCode, Json<Product>) {
    let product = payload.into_product();
    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
    state.products.insert(product.id, product.clone());
    (StatusCode::CREATED, Json(product))
}
