pub mod discount;
mod engine;

pub use engine::{OrderService, PlaceOrderRequest, PlacedOrder, RequestedItem};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::StoreError;

/// Time source for the coupon temporal gates, injectable so the window
/// checks are testable with a fixed now.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("items required")]
    EmptyItems,

    #[error("quantity must be greater than 0 for product {0}")]
    InvalidQuantity(String),

    #[error("product {0} not found")]
    ProductNotFound(String),

    #[error("invalid coupon code")]
    InvalidCoupon,

    #[error("coupon expired")]
    CouponExpired,

    #[error("coupon usage limit reached")]
    CouponUsageLimitReached,

    #[error(transparent)]
    Store(#[from] StoreError),
}
