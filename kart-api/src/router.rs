use std::future::ready;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::{
    routing::{get, post},
    Router,
};
use health::HealthRegistry;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::limiters::{self, ApiRateLimiter};
use crate::pricing::OrderService;
use crate::prometheus::{setup_metrics_recorder, track_metrics};
use crate::store::{ApiKeyStore, ProductStore};

const ORDER_BODY_SIZE: usize = 64 * 1024; // 64KB, carts are small

#[derive(Clone)]
pub struct State {
    pub products: Arc<dyn ProductStore + Send + Sync>,
    pub api_keys: Arc<dyn ApiKeyStore + Send + Sync>,
    pub orders: Arc<OrderService>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}

async fn index() -> &'static str {
    "kart-api"
}

pub fn router(
    state: State,
    liveness: HealthRegistry,
    metrics: bool,
    concurrency_limit: Option<usize>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_origin(AllowOrigin::mirror_request());

    let api_router = Router::new()
        .route("/api/product", get(api::product::list_products))
        .route("/api/product/{id}", get(api::product::get_product))
        .route("/api/order", post(api::order::place_order))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            limiters::rate_limit,
        ))
        .layer(DefaultBodyLimit::max(ORDER_BODY_SIZE));

    let status_router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(move || ready(liveness.get_status())));

    let mut router = Router::new().merge(api_router);

    if let Some(limit) = concurrency_limit {
        router = router.layer(ConcurrencyLimitLayer::new(limit));
    }

    let router = router
        .merge(status_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install the recorder unless asked to; a global recorder does not
    // play well with the crate being used as a library in tests.
    if metrics {
        let recorder_handle = setup_metrics_recorder();
        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
