use axum::extract::{Path, State};
use axum::Json;

use common_types::Product;

use crate::router;

use super::errors::ApiError;

pub async fn list_products(
    State(state): State<router::State>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.products.list().await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<router::State>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .products
        .get_by_id(&id)
        .await?
        .ok_or(ApiError::ProductNotFound)?;

    Ok(Json(product))
}
