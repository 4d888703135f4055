use shopsync_db::DbError;
use shopsync_shopify::ShopifyError;
use thiserror::Error;

/// Run-level failures. Any of these ends the run without a report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The catalog could not be fetched in full. No rows were written.
    #[error("catalog fetch failed: {0}")]
    RemoteUnavailable(#[source] ShopifyError),

    /// The store could not be reached; records after the failure were not attempted.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] DbError),

    #[error("a catalog sync is already running")]
    AlreadyRunning,
}

/// Per-record failures. Counted in the report's `failed` tally, never raised.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed record {catalog_id}: {reason}")]
    MalformedRecord { catalog_id: i64, reason: String },

    #[error("persisting record failed: {0}")]
    Persistence(#[source] DbError),

    #[error("product row for sku '{sku}' not found after upsert")]
    ProductMissing { sku: String },
}
