use std::{str::FromStr, time::Duration};

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/shopsync-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// `None` keeps whatever `sslmode` the connection URL specifies.
    pub ssl_mode: Option<PgSslMode>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ssl_mode: None,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &shopsync_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
            // Already validated by the config loader; anything unparseable is ignored.
            ssl_mode: config
                .db_ssl_mode
                .as_deref()
                .and_then(|mode| PgSslMode::from_str(mode).ok()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("sync run {id} is not in expected status '{expected_status}'")]
    InvalidSyncRunTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// Returns `true` when the error means the store itself cannot be reached,
    /// as opposed to a statement failing against a healthy connection.
    ///
    /// SQLSTATE class `08` (connection exception) and `57P0x` (operator
    /// intervention: shutdown, crash) count as unreachable.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            DbError::Sqlx(err) => match err {
                sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::Protocol(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed => true,
                sqlx::Error::Database(db) => db
                    .code()
                    .is_some_and(|code| code.starts_with("08") || code.starts_with("57P0")),
                _ => false,
            },
            DbError::NotFound
            | DbError::InvalidSyncRunTransition { .. }
            | DbError::Migration(_) => false,
        }
    }
}

/// Connect to a Postgres pool using an explicit URL and config.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the URL cannot be parsed or the connection
/// cannot be established.
pub async fn connect_pool(database_url: &str, config: &PoolConfig) -> Result<PgPool, DbError> {
    let mut options = PgConnectOptions::from_str(database_url)?;
    if let Some(mode) = config.ssl_mode {
        options = options.ssl_mode(mode);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations is absent on a fresh database; count that as zero.
    let applied_before = count_applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = count_applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn count_applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

pub mod listings;
pub mod products;
pub mod reconcile;
pub mod run_lock;
pub mod sales;
pub mod sync_runs;

pub use listings::{get_listing, upsert_listing, ListingRow, NewListing};
pub use products::{
    find_product_id_by_sku, get_product_by_sku, upsert_product, ProductRow, ProductUpsert,
};
pub use reconcile::{reconcile_product, UpsertOutcome};
pub use run_lock::{try_acquire_run_lock, RunLock};
pub use sales::{list_recent_sales, SaleRow};
pub use sync_runs::{
    complete_sync_run, create_sync_run, fail_sync_run, get_sync_run, list_sync_runs,
    start_sync_run, RunCounts, SyncRunRow,
};
