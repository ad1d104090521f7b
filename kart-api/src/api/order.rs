use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use metrics::counter;

use crate::{auth, router};

use super::errors::ApiError;
use super::types::{OrderRequest, OrderResponse};

pub async fn place_order(
    State(state): State<router::State>,
    headers: HeaderMap,
    Json(request): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    auth::authenticate(state.api_keys.as_ref(), &headers).await?;

    let placed = state.orders.place_order(request.into()).await?;

    counter!("kart_orders_placed_total").increment(1);

    Ok(Json(placed.into()))
}
