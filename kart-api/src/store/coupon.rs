use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use common_types::CouponRule;

use super::{CouponStore, StoreError};

const FIND_BY_CODE_SQL: &str = "SELECT code, discount_type, value, min_items, description, \
     valid_from, valid_until, max_uses, uses, max_discount \
     FROM coupons WHERE UPPER(code) = UPPER($1) AND active = TRUE";

const INCREMENT_USES_SQL: &str =
    "UPDATE coupons SET uses = uses + 1 WHERE UPPER(code) = UPPER($1)";

#[derive(Debug, FromRow)]
struct CouponRow {
    code: String,
    discount_type: String,
    value: Decimal,
    min_items: i32,
    description: String,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    max_uses: i32,
    uses: i32,
    max_discount: Decimal,
}

impl TryFrom<CouponRow> for CouponRule {
    type Error = StoreError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let kind = row
            .discount_type
            .parse()
            .map_err(|_| StoreError::InvalidDiscountKind(row.discount_type.clone()))?;

        Ok(CouponRule {
            code: row.code,
            kind,
            value: row.value,
            min_items: row.min_items,
            description: row.description,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            max_uses: row.max_uses,
            uses: row.uses,
            max_discount: row.max_discount,
        })
    }
}

pub struct PgCouponStore {
    pool: PgPool,
}

impl PgCouponStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponStore for PgCouponStore {
    async fn find_by_code(&self, code: &str) -> Result<CouponRule, StoreError> {
        let row = sqlx::query_as::<_, CouponRow>(FIND_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::CouponNotFound),
        }
    }

    async fn increment_uses(&self, code: &str) -> Result<(), StoreError> {
        sqlx::query(INCREMENT_USES_SQL)
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
