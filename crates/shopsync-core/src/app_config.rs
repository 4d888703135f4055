use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Store host, e.g. `"acme.myshopify.com"`. A scheme is tolerated and stripped
    /// by the client.
    pub shopify_store_domain: String,
    pub shopify_access_token: String,
    pub shopify_api_version: String,
    /// Products per Admin API page, `1..=250`.
    pub shopify_page_size: u32,
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_base_ms: u64,
    pub fetch_inter_request_delay_ms: u64,
    /// Upper bound on in-flight per-record reconcile transactions.
    pub sync_max_concurrency: usize,
    /// Six-field cron expression; `None` disables the scheduled trigger.
    pub sync_schedule: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Overrides the `sslmode` carried by `DATABASE_URL` when set.
    pub db_ssl_mode: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("shopify_store_domain", &self.shopify_store_domain)
            .field("shopify_access_token", &"[redacted]")
            .field("shopify_api_version", &self.shopify_api_version)
            .field("shopify_page_size", &self.shopify_page_size)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field(
                "fetch_retry_backoff_base_ms",
                &self.fetch_retry_backoff_base_ms,
            )
            .field(
                "fetch_inter_request_delay_ms",
                &self.fetch_inter_request_delay_ms,
            )
            .field("sync_max_concurrency", &self.sync_max_concurrency)
            .field("sync_schedule", &self.sync_schedule)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("db_ssl_mode", &self.db_ssl_mode)
            .finish()
    }
}
