use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{ApiKeyRecord, ApiKeyStore, StoreError};

const FIND_BY_HASH_SQL: &str =
    "SELECT id, key_hash, name, scopes FROM api_keys WHERE key_hash = $1 AND active = TRUE";

#[derive(Debug, FromRow)]
struct ApiKeyRow {
    id: String,
    key_hash: String,
    name: String,
    scopes: Vec<String>,
}

pub struct PgApiKeyStore {
    pool: PgPool,
}

impl PgApiKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyStore {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(FIND_BY_HASH_SQL)
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| ApiKeyRecord {
            id: row.id,
            key_hash: row.key_hash,
            name: row.name,
            scopes: row.scopes,
        }))
    }
}
