use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_attendance_per_min: u32,
    pub rate_query_per_min: u32,

    /// Extra read attempts after a transient store failure
    pub store_retry_attempts: u32,
    /// Rows per batch when preloading today's records
    pub cache_warmup_batch: usize,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            rate_attendance_per_min: env::var("RATE_ATTENDANCE_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
            rate_query_per_min: env::var("RATE_QUERY_PER_MIN")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap(),

            store_retry_attempts: env::var("STORE_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap(),
            cache_warmup_batch: env::var("CACHE_WARMUP_BATCH")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}
