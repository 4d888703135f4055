use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Shopify rejects `limit` values above this on `products.json`.
pub const MAX_SHOPIFY_PAGE_SIZE: u32 = 250;

const SSL_MODES: &[&str] = &[
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
];

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parsing and validation against an arbitrary lookup so tests can feed a
/// `HashMap` instead of mutating the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let shopify_store_domain = require("SHOPIFY_STORE_DOMAIN")?;
    let shopify_access_token = require("SHOPIFY_ACCESS_TOKEN")?;

    let env = parse_environment(&or_default("SHOPSYNC_ENV", "development"))?;

    // Hosted platforms often inject only `PORT`; an explicit bind address wins.
    let default_bind = lookup("PORT").map_or_else(
        |_| "0.0.0.0:3000".to_string(),
        |port| format!("0.0.0.0:{port}"),
    );
    let bind_addr = or_default("SHOPSYNC_BIND_ADDR", &default_bind)
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SHOPSYNC_BIND_ADDR", e.to_string()))?;

    let log_level = or_default("SHOPSYNC_LOG_LEVEL", "info");
    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2025-04");

    let shopify_page_size = parse_u32("SHOPSYNC_SHOPIFY_PAGE_SIZE", "250")?;
    if !(1..=MAX_SHOPIFY_PAGE_SIZE).contains(&shopify_page_size) {
        return Err(invalid(
            "SHOPSYNC_SHOPIFY_PAGE_SIZE",
            format!("must be between 1 and {MAX_SHOPIFY_PAGE_SIZE}, got {shopify_page_size}"),
        ));
    }

    let fetch_timeout_secs = parse_u64("SHOPSYNC_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_max_retries = parse_u32("SHOPSYNC_FETCH_MAX_RETRIES", "2")?;
    let fetch_retry_backoff_base_ms = parse_u64("SHOPSYNC_FETCH_RETRY_BACKOFF_BASE_MS", "1000")?;
    let fetch_inter_request_delay_ms = parse_u64("SHOPSYNC_FETCH_INTER_REQUEST_DELAY_MS", "500")?;

    let sync_max_concurrency = parse_usize("SHOPSYNC_SYNC_MAX_CONCURRENCY", "1")?;
    if sync_max_concurrency == 0 {
        return Err(invalid(
            "SHOPSYNC_SYNC_MAX_CONCURRENCY",
            "must be at least 1".to_string(),
        ));
    }
    let sync_schedule = lookup("SHOPSYNC_SYNC_SCHEDULE")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let db_max_connections = parse_u32("SHOPSYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SHOPSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SHOPSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    // A sync pins one connection for its run lock and needs one more per in-flight record.
    let required_connections = sync_max_concurrency.saturating_add(1);
    if usize::try_from(db_max_connections).unwrap_or(usize::MAX) < required_connections {
        return Err(invalid(
            "SHOPSYNC_DB_MAX_CONNECTIONS",
            format!(
                "must be at least SHOPSYNC_SYNC_MAX_CONCURRENCY + 1 ({required_connections}), got {db_max_connections}"
            ),
        ));
    }
    let db_ssl_mode = parse_ssl_mode(lookup("SHOPSYNC_DB_SSL_MODE").ok())?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        shopify_store_domain,
        shopify_access_token,
        shopify_api_version,
        shopify_page_size,
        fetch_timeout_secs,
        fetch_max_retries,
        fetch_retry_backoff_base_ms,
        fetch_inter_request_delay_ms,
        sync_max_concurrency,
        sync_schedule,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        db_ssl_mode,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPSYNC_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

fn parse_ssl_mode(raw: Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(raw) = raw.map(|s| s.trim().to_ascii_lowercase()) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    if SSL_MODES.contains(&raw.as_str()) {
        Ok(Some(raw))
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: "SHOPSYNC_DB_SSL_MODE".to_string(),
            reason: format!("unsupported mode \"{raw}\"; expected one of {SSL_MODES:?}"),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
