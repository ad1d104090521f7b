use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL")]
    pub database_url: String,

    /// Directory containing the couponbaseN.gz input files.
    #[envconfig(default = "data")]
    pub data_dir: String,

    /// Expected distinct tokens per input file.
    #[envconfig(default = "120000000")]
    pub filter_capacity: usize,

    /// Target per-filter false-positive rate.
    #[envconfig(default = "0.001")]
    pub filter_fpr: f64,

    #[envconfig(default = "4")]
    pub max_pg_connections: u32,
}
