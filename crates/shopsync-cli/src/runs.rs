//! `runs` command: recent sync audit rows.

use std::fmt::Write as _;

use shopsync_db::SyncRunRow;

pub(crate) async fn list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let rows = shopsync_db::list_sync_runs(pool, limit.clamp(1, 200)).await?;
    if rows.is_empty() {
        println!("no sync runs recorded");
        return Ok(());
    }
    for row in &rows {
        println!("{}", format_run(row));
    }
    Ok(())
}

fn format_run(row: &SyncRunRow) -> String {
    let mut line = format!(
        "{created}  {id}  {trigger:<8}  {status:<9}  {ok}/{attempted} ok, {failed} failed",
        created = row.created_at.format("%Y-%m-%d %H:%M"),
        id = row.public_id,
        trigger = row.trigger_source,
        status = row.status,
        ok = row.records_succeeded,
        attempted = row.records_attempted,
        failed = row.records_failed,
    );
    if let Some(message) = &row.error_message {
        let _ = write!(line, "  error: {message}");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row() -> SyncRunRow {
        SyncRunRow {
            id: 1,
            public_id: "00000000-0000-0000-0000-000000000001"
                .parse()
                .expect("uuid"),
            trigger_source: "cli".to_owned(),
            status: "failed".to_owned(),
            started_at: None,
            completed_at: None,
            records_attempted: 5,
            records_succeeded: 4,
            records_failed: 1,
            error_message: Some("store unavailable".to_owned()),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn formats_counts_and_error() {
        let line = format_run(&row());
        assert!(line.starts_with("2025-06-01 09:30  00000000-0000-0000-0000-000000000001"));
        assert!(line.contains("4/5 ok, 1 failed"));
        assert!(line.ends_with("error: store unavailable"));
    }

    #[test]
    fn omits_error_when_absent() {
        let mut row = row();
        row.error_message = None;
        assert!(!format_run(&row).contains("error:"));
    }
}
