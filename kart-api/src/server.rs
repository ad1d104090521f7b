use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use health::{ComponentStatus, HealthHandle, HealthRegistry};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::limiters::ApiRateLimiter;
use crate::pricing::OrderService;
use crate::router;
use crate::store::{PgApiKeyStore, PgCouponStore, PgOrderStore, PgProductStore};

const DATABASE_LIVENESS_DEADLINE: Duration = Duration::from_secs(30);
const DATABASE_PING_INTERVAL: Duration = Duration::from_secs(10);

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let liveness = HealthRegistry::new("liveness");

    let pool = common_database::get_pool(&config.database_url, config.max_pg_connections)
        .await
        .context("failed to connect to database")?;
    common_database::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let database_liveness = liveness
        .register("database".to_string(), DATABASE_LIVENESS_DEADLINE)
        .await;
    tokio::spawn(monitor_database(pool.clone(), database_liveness));

    let products = Arc::new(PgProductStore::new(pool.clone()));
    let coupons = Arc::new(PgCouponStore::new(pool.clone()));
    let orders = Arc::new(PgOrderStore::new(pool.clone()));
    let api_keys = Arc::new(PgApiKeyStore::new(pool));

    let order_service = Arc::new(OrderService::new(products.clone(), coupons, orders));

    let rate_limiter = Arc::new(ApiRateLimiter::new(
        config.rate_limit_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    let state = router::State {
        products,
        api_keys,
        orders: order_service,
        rate_limiter,
    };

    let app = router::router(
        state,
        liveness,
        config.export_prometheus,
        config.concurrency_limit,
    );

    info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("server error")?;

    Ok(())
}

/// Pings the pool on an interval so the liveness probe notices a dead
/// database connection.
async fn monitor_database(pool: PgPool, handle: HealthHandle) {
    let mut interval = tokio::time::interval(DATABASE_PING_INTERVAL);
    loop {
        interval.tick().await;
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => handle.report_healthy().await,
            Err(err) => {
                tracing::warn!(error = %err, "database ping failed");
                handle.report_status(ComponentStatus::Unhealthy).await;
            }
        }
    }
}
