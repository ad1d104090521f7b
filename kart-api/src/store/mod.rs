use async_trait::async_trait;
use thiserror::Error;

use common_types::{CouponRule, Order, Product};

mod apikey;
mod coupon;
mod order;
mod product;

pub use apikey::PgApiKeyStore;
pub use coupon::PgCouponStore;
pub use order::PgOrderStore;
pub use product::PgProductStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("coupon not found")]
    CouponNotFound,

    #[error("invalid stored discount kind: {0}")]
    InvalidDiscountKind(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Fetches every matching product in one query; missing IDs are simply
    /// absent from the result.
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, StoreError>;
}

/// Lookup and mutation of coupon rules.
#[async_trait]
pub trait CouponStore {
    /// Case-insensitive lookup of an active coupon.
    async fn find_by_code(&self, code: &str) -> Result<CouponRule, StoreError>;

    /// Atomic `uses = uses + 1`. Never a read-modify-write.
    async fn increment_uses(&self, code: &str) -> Result<(), StoreError>;
}

/// Persistence of completed orders.
#[async_trait]
pub trait OrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError>;
}

/// Identity and permission data for a stored API key.
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub id: String,
    pub key_hash: String,
    pub name: String,
    pub scopes: Vec<String>,
}

#[async_trait]
pub trait ApiKeyStore {
    /// Looks up an active API key by the hex SHA-256 of its plaintext.
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError>;
}
