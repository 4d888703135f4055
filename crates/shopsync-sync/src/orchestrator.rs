//! The sync run: lock, fetch, normalize, reconcile, report.

use futures::stream::{self, StreamExt};
use shopsync_core::{AppConfig, NormalizedProduct};
use shopsync_db::{DbError, RunCounts, UpsertOutcome};
use shopsync_shopify::{normalize_product, RawProduct, ShopifyError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{RecordError, SyncError};
use crate::report::{SyncReport, Trigger};
use crate::source::CatalogSource;
use crate::state::SyncState;

/// Advisory lock key shared by every process that runs catalog syncs.
pub const RUN_LOCK_NAME: &str = "shopsync.catalog_sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Records reconciled at once. `1` reconciles sequentially.
    pub max_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { max_concurrency: 1 }
    }
}

impl SyncOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_concurrency: config.sync_max_concurrency.max(1),
        }
    }
}

/// Runs catalog syncs from `source` into `pool`.
///
/// Holds no per-run state; overlapping calls (from this process or another)
/// are serialized by the Postgres advisory lock and the loser gets
/// [`SyncError::AlreadyRunning`].
#[derive(Debug)]
pub struct CatalogSync<S> {
    source: S,
    pool: PgPool,
    options: SyncOptions,
}

/// Result of fetching and normalizing without writing anything.
#[derive(Debug)]
pub struct CatalogPreview {
    pub fetched: usize,
    pub products: Vec<NormalizedProduct>,
    pub malformed: Vec<RecordError>,
}

/// Fetches and normalizes the catalog; touches no database.
///
/// # Errors
///
/// Returns [`SyncError::RemoteUnavailable`] if the fetch fails.
pub async fn preview_catalog<S: CatalogSource>(source: &S) -> Result<CatalogPreview, SyncError> {
    let raw = source
        .fetch_catalog()
        .await
        .map_err(SyncError::RemoteUnavailable)?;

    let mut products = Vec::with_capacity(raw.len());
    let mut malformed = Vec::new();
    for record in &raw {
        match normalize_record(record, source.store_host()) {
            Ok(product) => products.push(product),
            Err(err) => malformed.push(err),
        }
    }

    Ok(CatalogPreview {
        fetched: raw.len(),
        products,
        malformed,
    })
}

impl<S: CatalogSource> CatalogSync<S> {
    #[must_use]
    pub fn new(source: S, pool: PgPool, options: SyncOptions) -> Self {
        Self {
            source,
            pool,
            options,
        }
    }

    /// Runs one full sync. `trigger` only labels the audit row.
    ///
    /// Per-record failures (malformed record, missing product, statement
    /// error) are logged and counted in the report. Products missing from the
    /// catalog are left untouched.
    ///
    /// # Errors
    ///
    /// - [`SyncError::AlreadyRunning`]: another run holds the advisory lock.
    /// - [`SyncError::RemoteUnavailable`]: the fetch failed; nothing was written.
    /// - [`SyncError::StoreUnavailable`]: the store became unreachable, either
    ///   while taking the lock or mid-reconcile.
    pub async fn run_sync(&self, trigger: Trigger) -> Result<SyncReport, SyncError> {
        let lock = shopsync_db::try_acquire_run_lock(&self.pool, RUN_LOCK_NAME)
            .await
            .map_err(SyncError::StoreUnavailable)?
            .ok_or(SyncError::AlreadyRunning)?;

        let result = self.run_locked(trigger).await;

        if let Err(err) = lock.release().await {
            tracing::warn!(error = %err, "failed to release run lock; session closed instead");
        }
        result
    }

    async fn run_locked(&self, trigger: Trigger) -> Result<SyncReport, SyncError> {
        let mut state = SyncState::Idle;
        let audit = AuditRow::open(&self.pool, trigger).await;
        let mut report = SyncReport {
            run_id: audit.public_id,
            ..SyncReport::default()
        };

        advance(&mut state, SyncState::Fetching);
        let raw = match self.source.fetch_catalog().await {
            Ok(raw) => raw,
            Err(err) => {
                advance(&mut state, SyncState::Failed);
                tracing::error!(trigger = %trigger, error = %err, "catalog fetch failed");
                audit
                    .fail(&self.pool, &format!("{err}"), run_counts(&report))
                    .await;
                return Err(SyncError::RemoteUnavailable(err));
            }
        };
        report.attempted = raw.len();
        tracing::info!(trigger = %trigger, records = raw.len(), "catalog fetched");

        advance(&mut state, SyncState::Normalizing);
        let store_host = self.source.store_host();
        let mut normalized = Vec::with_capacity(raw.len());
        for record in &raw {
            match normalize_record(record, store_host) {
                Ok(product) => normalized.push(product),
                Err(err) => {
                    tracing::warn!(catalog_id = record.id, error = %err, "skipping record");
                    report.failed += 1;
                }
            }
        }

        advance(&mut state, SyncState::Reconciling);
        let mut outcomes = stream::iter(normalized)
            .map(|product| {
                let pool = self.pool.clone();
                async move {
                    let outcome = reconcile_record(&pool, &product).await;
                    (product, outcome)
                }
            })
            .buffer_unordered(self.options.max_concurrency.max(1));

        while let Some((product, outcome)) = outcomes.next().await {
            match outcome {
                Ok(RecordApplied {
                    product_created,
                    listing_created,
                }) => {
                    report.succeeded += 1;
                    report.products_created += usize::from(product_created);
                    report.listings_created += usize::from(listing_created);
                }
                Err(RecordError::Persistence(err)) if err.is_connectivity() => {
                    // Dropping the stream cancels in-flight records; their
                    // transactions roll back uncommitted.
                    drop(outcomes);
                    advance(&mut state, SyncState::Failed);
                    report.failed += 1;
                    tracing::error!(
                        catalog_id = product.catalog_id,
                        sku = %product.sku,
                        error = %err,
                        "store unreachable, aborting sync"
                    );
                    audit
                        .fail(&self.pool, &format!("{err}"), run_counts(&report))
                        .await;
                    return Err(SyncError::StoreUnavailable(err));
                }
                Err(err) => {
                    tracing::warn!(
                        catalog_id = product.catalog_id,
                        sku = %product.sku,
                        error = %err,
                        "record failed"
                    );
                    report.failed += 1;
                }
            }
        }

        advance(&mut state, SyncState::Done);
        audit.complete(&self.pool, run_counts(&report)).await;
        tracing::info!(
            trigger = %trigger,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            products_created = report.products_created,
            listings_created = report.listings_created,
            "sync complete"
        );
        Ok(report)
    }
}

struct RecordApplied {
    product_created: bool,
    listing_created: bool,
}

async fn reconcile_record(
    pool: &PgPool,
    product: &NormalizedProduct,
) -> Result<RecordApplied, RecordError> {
    match shopsync_db::reconcile_product(pool, product).await {
        Ok(UpsertOutcome::Applied {
            product_created,
            listing_created,
            ..
        }) => Ok(RecordApplied {
            product_created,
            listing_created,
        }),
        Ok(UpsertOutcome::ProductMissing) => Err(RecordError::ProductMissing {
            sku: product.sku.clone(),
        }),
        Err(err) => Err(RecordError::Persistence(err)),
    }
}

fn normalize_record(record: &RawProduct, store_host: &str) -> Result<NormalizedProduct, RecordError> {
    normalize_product(record, store_host).map_err(|err| match err {
        ShopifyError::MalformedRecord { catalog_id, reason } => {
            RecordError::MalformedRecord { catalog_id, reason }
        }
        other => RecordError::MalformedRecord {
            catalog_id: record.id,
            reason: other.to_string(),
        },
    })
}

fn advance(state: &mut SyncState, next: SyncState) {
    match state.transition_to(next) {
        Ok(next) => {
            tracing::debug!(from = ?*state, to = ?next, "sync state");
            *state = next;
        }
        Err(err) => tracing::error!(error = %err, "ignoring illegal sync state transition"),
    }
}

fn run_counts(report: &SyncReport) -> RunCounts {
    let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    RunCounts {
        attempted: clamp(report.attempted),
        succeeded: clamp(report.succeeded),
        failed: clamp(report.failed),
    }
}

/// Best-effort handle on this run's `sync_runs` row. Audit writes that fail
/// are logged and never change the outcome of the run.
struct AuditRow {
    id: Option<i64>,
    public_id: Option<Uuid>,
}

impl AuditRow {
    async fn open(pool: &PgPool, trigger: Trigger) -> Self {
        let row = match shopsync_db::create_sync_run(pool, trigger.as_str()).await {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create sync_runs row");
                return Self {
                    id: None,
                    public_id: None,
                };
            }
        };

        if let Err(err) = shopsync_db::start_sync_run(pool, row.id).await {
            tracing::warn!(run_id = row.id, error = %err, "failed to mark sync run running");
            return Self {
                id: None,
                public_id: Some(row.public_id),
            };
        }

        Self {
            id: Some(row.id),
            public_id: Some(row.public_id),
        }
    }

    async fn complete(&self, pool: &PgPool, counts: RunCounts) {
        let Some(id) = self.id else { return };
        if let Err(err) = shopsync_db::complete_sync_run(pool, id, counts).await {
            log_audit_failure(id, "succeeded", &err);
        }
    }

    async fn fail(&self, pool: &PgPool, message: &str, counts: RunCounts) {
        let Some(id) = self.id else { return };
        if let Err(err) = shopsync_db::fail_sync_run(pool, id, message, counts).await {
            log_audit_failure(id, "failed", &err);
        }
    }
}

fn log_audit_failure(run_id: i64, status: &str, err: &DbError) {
    tracing::error!(run_id, status, error = %err, "failed to finalize sync run");
}
