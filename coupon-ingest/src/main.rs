use envconfig::Envconfig;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use coupon_ingest::config::Config;
use coupon_ingest::{pipeline, store};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();
    info!("starting coupon ingest");

    let config = Config::init_from_env().expect("Invalid configuration:");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling pipeline");
                cancel.cancel();
            }
        });
    }

    let pipeline_config = pipeline::PipelineConfig {
        data_dir: config.data_dir.clone().into(),
        filter_capacity: config.filter_capacity,
        filter_fpr: config.filter_fpr,
    };

    let confirmed = pipeline::run(&pipeline_config, &cancel).await?;

    if confirmed.is_empty() {
        info!("no valid codes to insert");
        return Ok(());
    }

    info!("connecting to database");
    let pool = common_database::get_pool(&config.database_url, config.max_pg_connections).await?;

    store::upsert_confirmed(&pool, &confirmed).await?;

    info!("coupon ingest completed successfully");
    Ok(())
}
