use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use common_types::{Image, Product};

use super::{ProductStore, StoreError};

const PRODUCT_COLUMNS: &str = "id, name, price, category, \
     image_thumbnail, image_mobile, image_tablet, image_desktop";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price: Decimal,
    category: String,
    image_thumbnail: String,
    image_mobile: String,
    image_tablet: String,
    image_desktop: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: row.price,
            category: row.category,
            image: Image {
                thumbnail: row.image_thumbnail,
                mobile: row.image_mobile,
                tablet: row.image_tablet,
                desktop: row.image_desktop,
            },
        }
    }
}

pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, StoreError> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, ProductRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
