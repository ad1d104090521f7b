//! Per-client request rate limiting for the public API routes.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{clock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use metrics::counter;

use crate::api::errors::ApiError;
use crate::router;

// See: https://docs.rs/governor/latest/governor/_guide/index.html#usage-in-multiple-threads
pub struct ApiRateLimiter {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, clock::DefaultClock>,
}

impl ApiRateLimiter {
    /// Allows `requests` per `window` for each client key, with the full
    /// window available as burst.
    pub fn new(requests: NonZeroU32, window: Duration) -> Self {
        let quota = Quota::with_period(window / requests.get())
            .expect("rate limit window must be non-zero")
            .allow_burst(requests);

        Self {
            limiter: RateLimiter::dashmap(quota),
        }
    }

    pub fn is_limited(&self, key: &str) -> bool {
        self.limiter.check_key(&key.to_string()).is_err()
    }
}

/// Axum middleware enforcing the per-client limit; clients over quota get
/// a 429.
pub async fn rate_limit(
    State(state): State<router::State>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    if state.rate_limiter.is_limited(&key) {
        counter!("kart_requests_rate_limited_total").increment(1);
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}

/// Clients behind a proxy are keyed by the first x-forwarded-for hop,
/// otherwise by peer address.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_quota_then_limits() {
        let limiter = ApiRateLimiter::new(
            NonZeroU32::new(3).unwrap(),
            Duration::from_secs(60),
        );

        for _ in 0..3 {
            assert!(!limiter.is_limited("10.0.0.1"));
        }
        assert!(limiter.is_limited("10.0.0.1"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = ApiRateLimiter::new(
            NonZeroU32::new(1).unwrap(),
            Duration::from_secs(60),
        );

        assert!(!limiter.is_limited("10.0.0.1"));
        assert!(limiter.is_limited("10.0.0.1"));
        assert!(!limiter.is_limited("10.0.0.2"));
    }
}
