//! Session-scoped advisory lock that keeps sync runs from overlapping.
//!
//! The lock lives on one dedicated pooled connection. Advisory locks belong
//! to the Postgres session, so the connection must stay checked out for as
//! long as the lock is held and must never go back to the pool still locked.

use sqlx::{pool::PoolConnection, PgPool, Postgres};

use crate::DbError;

/// A held advisory lock. Call [`RunLock::release`] when the run finishes.
///
/// Dropping an unreleased lock detaches its connection from the pool and
/// closes it, which ends the session and frees the lock server-side.
#[derive(Debug)]
pub struct RunLock {
    conn: Option<PoolConnection<Postgres>>,
    name: String,
}

/// Tries to take the named lock without waiting.
///
/// Returns `Ok(None)` when another session already holds it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a connection cannot be acquired or the lock
/// query fails.
pub async fn try_acquire_run_lock(pool: &PgPool, name: &str) -> Result<Option<RunLock>, DbError> {
    let mut conn = pool.acquire().await?;

    let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock(hashtext($1))")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    if !acquired {
        return Ok(None);
    }

    Ok(Some(RunLock {
        conn: Some(conn),
        name: name.to_string(),
    }))
}

impl RunLock {
    /// Releases the lock and returns the connection to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the unlock query fails. The connection is
    /// closed in that case, so the lock is still freed when the session ends.
    pub async fn release(mut self) -> Result<(), DbError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        let result = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock(hashtext($1))")
            .bind(&self.name)
            .fetch_one(&mut *conn)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                drop(conn.detach());
                Err(err.into())
            }
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!(lock = %self.name, "run lock dropped without release; closing its session");
            drop(conn.detach());
        }
    }
}
