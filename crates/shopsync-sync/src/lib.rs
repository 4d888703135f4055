//! Catalog sync orchestration: fetch from a [`CatalogSource`], normalize,
//! and reconcile each record into Postgres under a run-wide advisory lock.

pub mod error;
pub mod orchestrator;
pub mod report;
pub mod source;
pub mod state;

pub use error::{RecordError, SyncError};
pub use orchestrator::{preview_catalog, CatalogPreview, CatalogSync, SyncOptions, RUN_LOCK_NAME};
pub use report::{SyncReport, Trigger};
pub use source::CatalogSource;
pub use state::{IllegalTransition, SyncState};
