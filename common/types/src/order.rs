use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed customer order. Created exactly once per successful
/// placement, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub discounts: Decimal,
    /// Empty string when no coupon was applied.
    pub coupon_code: String,
    pub created_at: DateTime<Utc>,
}

/// A single line item in an order; this is the shape persisted in the
/// orders table's JSONB column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_items_round_trip_exactly() {
        let items = vec![
            OrderItem {
                product_id: "1".to_string(),
                quantity: 2,
            },
            OrderItem {
                product_id: "waffle-04".to_string(),
                quantity: 1,
            },
        ];

        let json = serde_json::to_string(&items).unwrap();
        let back: Vec<OrderItem> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn monetary_values_serialize_as_strings() {
        let order = Order {
            id: Uuid::nil(),
            items: vec![],
            total: Decimal::new(650, 2),
            discounts: Decimal::new(0, 2),
            coupon_code: String::new(),
            created_at: DateTime::<Utc>::MIN_UTC,
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["total"], serde_json::json!("6.50"));
        assert_eq!(value["discounts"], serde_json::json!("0.00"));
    }
}
