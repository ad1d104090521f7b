use std::net::SocketAddr;
use std::num::NonZeroU32;

use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "0.0.0.0:8080")]
    pub address: SocketAddr,

    #[envconfig(from = "DATABASE_URL")]
    pub database_url: String,

    #[envconfig(default = "10")]
    pub max_pg_connections: u32,

    /// Requests allowed per client per window before 429.
    #[envconfig(default = "100")]
    pub rate_limit_requests: NonZeroU32,

    #[envconfig(default = "60")]
    pub rate_limit_window_secs: u64,

    pub concurrency_limit: Option<usize>,

    // Used for integration tests
    #[envconfig(default = "true")]
    pub export_prometheus: bool,
}
