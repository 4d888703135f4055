//! Background job scheduler.
//!
//! Registers the recurring catalog sync when a cron schedule is configured.

use std::sync::Arc;

use shopsync_shopify::ShopifyAdminClient;
use shopsync_sync::{CatalogSync, SyncError, Trigger};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `schedule` is not a valid six-field cron expression, or the scheduler
/// fails to start.
pub async fn build_scheduler(
    sync: Arc<CatalogSync<ShopifyAdminClient>>,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_sync_job(&scheduler, sync, schedule).await?;

    scheduler.start().await?;
    tracing::info!(schedule, "scheduler: catalog sync registered");
    Ok(scheduler)
}

async fn register_sync_job(
    scheduler: &JobScheduler,
    sync: Arc<CatalogSync<ShopifyAdminClient>>,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let sync = Arc::clone(&sync);

        Box::pin(async move {
            tracing::info!("scheduler: starting catalog sync");
            match sync.run_sync(Trigger::Schedule).await {
                Ok(report) => tracing::info!(
                    attempted = report.attempted,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    products_created = report.products_created,
                    "scheduler: catalog sync complete"
                ),
                // A manual or CLI run overlapping the tick is expected.
                Err(SyncError::AlreadyRunning) => {
                    tracing::info!("scheduler: sync already running; skipping tick");
                }
                Err(e) => tracing::error!(error = %e, "scheduler: catalog sync failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
