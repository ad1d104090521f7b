//! In-memory store implementations backing the engine and handler tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use common_types::{CouponRule, Image, Order, Product};

use crate::auth::hash_key;
use crate::pricing::Clock;
use crate::store::{
    ApiKeyRecord, ApiKeyStore, CouponStore, OrderStore, ProductStore, StoreError,
};

pub fn product(id: &str, name: &str, price: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price: price.parse().unwrap(),
        category: "dessert".to_string(),
        image: Image::default(),
    }
}

pub struct MemoryProductStore {
    products: HashMap<String, Product>,
}

impl MemoryProductStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(id).cloned())
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect())
    }
}

/// Coupon store keyed by uppercase code, mirroring the storage-side
/// canonicalization of the Postgres implementation.
#[derive(Default)]
pub struct MemoryCouponStore {
    rules: Mutex<HashMap<String, CouponRule>>,
}

impl MemoryCouponStore {
    pub fn new(rules: Vec<CouponRule>) -> Self {
        Self {
            rules: Mutex::new(
                rules
                    .into_iter()
                    .map(|r| (r.code.to_uppercase(), r))
                    .collect(),
            ),
        }
    }

    pub fn uses(&self, code: &str) -> i32 {
        self.rules
            .lock()
            .unwrap()
            .get(&code.to_uppercase())
            .map(|r| r.uses)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CouponStore for MemoryCouponStore {
    async fn find_by_code(&self, code: &str) -> Result<CouponRule, StoreError> {
        self.rules
            .lock()
            .unwrap()
            .get(&code.to_uppercase())
            .cloned()
            .ok_or(StoreError::CouponNotFound)
    }

    async fn increment_uses(&self, code: &str) -> Result<(), StoreError> {
        if let Some(rule) = self.rules.lock().unwrap().get_mut(&code.to_uppercase()) {
            rule.uses += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<Order>>,
}

impl MemoryOrderStore {
    pub fn created(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(())
    }
}

pub struct MemoryApiKeyStore {
    records: Vec<ApiKeyRecord>,
}

impl MemoryApiKeyStore {
    /// Stores the given plaintext keys hashed, as the seed tool would.
    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            records: keys
                .iter()
                .enumerate()
                .map(|(i, key)| ApiKeyRecord {
                    id: format!("key-{i}"),
                    key_hash: hash_key(key),
                    name: "test key".to_string(),
                    scopes: vec!["create_order".to_string()],
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ApiKeyStore for MemoryApiKeyStore {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.key_hash == key_hash)
            .cloned())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn rule(code: &str, kind: common_types::DiscountKind, value: &str) -> CouponRule {
    CouponRule {
        code: code.to_string(),
        kind,
        value: value.parse().unwrap(),
        min_items: 0,
        description: format!("{code} test rule"),
        valid_from: None,
        valid_until: None,
        max_uses: 0,
        uses: 0,
        max_discount: Decimal::ZERO,
    }
}
