//! Read side of the `sales` table. Rows are written by the point-of-sale
//! export, never by the sync job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleRow {
    pub sku: Option<String>,
    pub title: Option<String>,
    pub sold_at: Option<DateTime<Utc>>,
    pub price: Option<Decimal>,
}

/// Returns the newest `limit` sales ordered by `sold_at` descending.
///
/// Rows without a `sold_at` sort last.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_sales(pool: &PgPool, limit: i64) -> Result<Vec<SaleRow>, DbError> {
    let rows = sqlx::query_as::<_, SaleRow>(
        "SELECT sku, title, sold_at, price \
         FROM sales \
         ORDER BY sold_at DESC NULLS LAST, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
