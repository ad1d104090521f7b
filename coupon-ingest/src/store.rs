use sqlx::PgPool;
use tracing::info;

use crate::rules::rule_for_code;

/// Idempotent by code; the code is canonicalized to uppercase at the
/// storage boundary. Usage and validity columns are left untouched so a
/// re-run never resets live counters.
const UPSERT_COUPON_SQL: &str = "INSERT INTO coupons (code, discount_type, value, min_items, description, active) \
     VALUES (UPPER($1), $2, $3, $4, $5, TRUE) \
     ON CONFLICT (code) DO UPDATE SET \
         discount_type = EXCLUDED.discount_type, value = EXCLUDED.value, \
         min_items = EXCLUDED.min_items, description = EXCLUDED.description, \
         active = EXCLUDED.active";

/// Upserts every confirmed code with its rule from the lookup table.
pub async fn upsert_confirmed(pool: &PgPool, codes: &[String]) -> Result<(), sqlx::Error> {
    info!(count = codes.len(), "writing coupons to database");

    for (i, code) in codes.iter().enumerate() {
        let rule = rule_for_code(code);

        sqlx::query(UPSERT_COUPON_SQL)
            .bind(code)
            .bind(rule.kind.as_str())
            .bind(rule.value)
            .bind(rule.min_items)
            .bind(rule.description)
            .execute(pool)
            .await?;

        if (i + 1) % 100 == 0 || i + 1 == codes.len() {
            info!(written = i + 1, total = codes.len(), "write progress");
        }
    }

    Ok(())
}
