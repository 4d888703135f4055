use serde::Serialize;
use uuid::Uuid;

/// What started a run. Written to `sync_runs.trigger_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Http,
    Schedule,
    Cli,
}

impl Trigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Http => "http",
            Trigger::Schedule => "schedule",
            Trigger::Cli => "cli",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a completed run. `succeeded + failed == attempted`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Public id of the `sync_runs` row, `None` if the audit row could not be written.
    pub run_id: Option<Uuid>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub products_created: usize,
    pub listings_created: usize,
}
