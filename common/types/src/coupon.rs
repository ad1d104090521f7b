use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The supported coupon discount strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage of the subtotal.
    Percentage,
    /// Fixed monetary amount, capped at the subtotal.
    Fixed,
    /// The cheapest single item is free (unit price, not line total).
    FreeLowest,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
            DiscountKind::FreeLowest => "free_lowest",
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed" => Ok(DiscountKind::Fixed),
            "free_lowest" => Ok(DiscountKind::FreeLowest),
            _ => Err(format!("unknown discount kind: {s}")),
        }
    }
}

/// A coupon's discount behavior and eligibility constraints. The stored code
/// is canonicalized to uppercase; `uses` is only ever mutated through the
/// store's atomic increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRule {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_items: i32,
    pub description: String,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    /// 0 means unlimited.
    pub max_uses: i32,
    pub uses: i32,
    /// 0 means no cap.
    pub max_discount: Decimal,
}

/// A computed discount: the amount to subtract from the subtotal and the
/// rule's human-readable description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub amount: Decimal,
    pub description: String,
}

/// A line item in the cart for pricing purposes, request-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}
