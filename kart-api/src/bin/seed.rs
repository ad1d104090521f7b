//! Seeds the database: schema, product catalog, challenge coupons, and a
//! default API key. Safe to run repeatedly; every write is an upsert.

use envconfig::Envconfig;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use common_types::{DiscountKind, Product};
use kart_api::auth::hash_key;

#[derive(Envconfig)]
struct SeedConfig {
    #[envconfig(from = "DATABASE_URL")]
    pub database_url: String,

    #[envconfig(from = "SEED_PRODUCTS_FILE", default = "db/seed/products.json")]
    pub products_file: String,

    /// Plaintext key to seed; only its hash is stored.
    #[envconfig(from = "SEED_API_KEY")]
    pub api_key: String,

    #[envconfig(default = "4")]
    pub max_pg_connections: u32,
}

const UPSERT_PRODUCT_SQL: &str = "INSERT INTO products (id, name, price, category, image_thumbnail, image_mobile, image_tablet, image_desktop) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
     ON CONFLICT (id) DO UPDATE SET \
         name = EXCLUDED.name, price = EXCLUDED.price, category = EXCLUDED.category, \
         image_thumbnail = EXCLUDED.image_thumbnail, image_mobile = EXCLUDED.image_mobile, \
         image_tablet = EXCLUDED.image_tablet, image_desktop = EXCLUDED.image_desktop";

const UPSERT_COUPON_SQL: &str = "INSERT INTO coupons (code, discount_type, value, min_items, description, active) \
     VALUES (UPPER($1), $2, $3, $4, $5, $6) \
     ON CONFLICT (code) DO UPDATE SET \
         discount_type = EXCLUDED.discount_type, value = EXCLUDED.value, \
         min_items = EXCLUDED.min_items, description = EXCLUDED.description, \
         active = EXCLUDED.active";

const UPSERT_API_KEY_SQL: &str = "INSERT INTO api_keys (id, key_hash, name, scopes, active) \
     VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (id) DO UPDATE SET \
         key_hash = EXCLUDED.key_hash, name = EXCLUDED.name, \
         scopes = EXCLUDED.scopes, active = EXCLUDED.active";

struct SeedCoupon {
    code: &'static str,
    kind: DiscountKind,
    value: Decimal,
    min_items: i32,
    description: &'static str,
}

fn challenge_coupons() -> Vec<SeedCoupon> {
    vec![
        SeedCoupon {
            code: "HAPPYHOURS",
            kind: DiscountKind::Percentage,
            value: Decimal::from(18),
            min_items: 0,
            description: "Happy Hours: 18% off entire order",
        },
        SeedCoupon {
            code: "BUYGETONE",
            kind: DiscountKind::FreeLowest,
            value: Decimal::ZERO,
            min_items: 2,
            description: "Buy one get one: lowest priced item free",
        },
    ]
}

async fn seed_products(pool: &PgPool, path: &str) -> anyhow::Result<()> {
    info!(path, "reading products file");

    let data = std::fs::read_to_string(path)?;
    let products: Vec<Product> = serde_json::from_str(&data)?;

    info!(count = products.len(), "upserting products");

    for product in &products {
        sqlx::query(UPSERT_PRODUCT_SQL)
            .bind(&product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.category)
            .bind(&product.image.thumbnail)
            .bind(&product.image.mobile)
            .bind(&product.image.tablet)
            .bind(&product.image.desktop)
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn seed_coupons(pool: &PgPool) -> anyhow::Result<()> {
    info!("seeding challenge coupons");

    for coupon in challenge_coupons() {
        sqlx::query(UPSERT_COUPON_SQL)
            .bind(coupon.code)
            .bind(coupon.kind.as_str())
            .bind(coupon.value)
            .bind(coupon.min_items)
            .bind(coupon.description)
            .bind(true)
            .execute(pool)
            .await?;

        info!(code = coupon.code, "upserted coupon");
    }

    Ok(())
}

async fn seed_api_key(pool: &PgPool, api_key: &str) -> anyhow::Result<()> {
    info!("seeding default API key");

    let scopes = vec!["create_order".to_string()];
    sqlx::query(UPSERT_API_KEY_SQL)
        .bind("default")
        .bind(hash_key(api_key))
        .bind("Default test key")
        .bind(&scopes)
        .bind(true)
        .execute(pool)
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();

    let config = SeedConfig::init_from_env().expect("Invalid configuration:");

    info!("connecting to database");
    let pool = common_database::get_pool(&config.database_url, config.max_pg_connections).await?;
    common_database::run_migrations(&pool).await?;

    seed_products(&pool, &config.products_file).await?;
    seed_coupons(&pool).await?;
    seed_api_key(&pool, &config.api_key).await?;

    info!("seed completed successfully");
    Ok(())
}
