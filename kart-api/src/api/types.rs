use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use common_types::Product;

use crate::pricing::{PlaceOrderRequest, PlacedOrder, RequestedItem};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Absent and empty are equivalent: no coupon. The value is not trimmed.
    #[serde(default)]
    pub coupon_code: String,
    #[serde(default)]
    pub items: Vec<OrderItemPayload>,
}

impl From<OrderRequest> for PlaceOrderRequest {
    fn from(request: OrderRequest) -> Self {
        PlaceOrderRequest {
            items: request
                .items
                .into_iter()
                .map(|item| RequestedItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            coupon_code: request.coupon_code,
        }
    }
}

/// Monetary fields serialize as strings, per the decimal wire convention.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub total: Decimal,
    pub discounts: Decimal,
    pub items: Vec<OrderItemPayload>,
    pub products: Vec<Product>,
}

impl From<PlacedOrder> for OrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        OrderResponse {
            id: placed.order.id.to_string(),
            total: placed.order.total,
            discounts: placed.order.discounts,
            items: placed
                .order
                .items
                .into_iter()
                .map(|item| OrderItemPayload {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            products: placed.products,
        }
    }
}
