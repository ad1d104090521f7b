use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use common_types::Order;

use super::{OrderStore, StoreError};

const CREATE_ORDER_SQL: &str = "INSERT INTO orders (id, items, total, discounts, coupon_code, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6)";

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(CREATE_ORDER_SQL)
            .bind(order.id)
            .bind(Json(&order.items))
            .bind(order.total)
            .bind(order.discounts)
            .bind(&order.coupon_code)
            .bind(order.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
