use axum::{extract::State, Extension, Json};
use serde::Serialize;
use shopsync_sync::{SyncError, SyncReport, Trigger};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct SyncOutcome {
    status: &'static str,
    message: &'static str,
    report: SyncReport,
}

/// Runs a full catalog sync inside the request.
///
/// The response waits for the run to finish; per-record failures are
/// reported in `report` without failing the request.
pub(super) async fn trigger_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SyncOutcome>>, ApiError> {
    match state.sync.run_sync(Trigger::Http).await {
        Ok(report) => {
            tracing::info!(
                request_id = %req_id.0,
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed,
                "http-triggered sync complete"
            );
            Ok(Json(ApiResponse {
                data: SyncOutcome {
                    status: "complete",
                    message: "Shopify sync complete",
                    report,
                },
                meta: ResponseMeta::new(req_id.0),
            }))
        }
        Err(err) => Err(map_sync_error(req_id.0, &err)),
    }
}

fn map_sync_error(request_id: String, error: &SyncError) -> ApiError {
    match error {
        SyncError::AlreadyRunning => {
            tracing::info!("sync request refused: run already in progress");
            ApiError::new(request_id, "conflict", error.to_string())
        }
        SyncError::RemoteUnavailable(_) | SyncError::StoreUnavailable(_) => {
            tracing::error!(error = %error, "http-triggered sync failed");
            ApiError::new(request_id, "sync_failed", error.to_string())
        }
    }
}
