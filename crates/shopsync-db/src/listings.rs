//! Database operations for `listings`.

use chrono::{DateTime, Utc};
use shopsync_core::{CoreError, ListingStatus};
use sqlx::PgExecutor;

use crate::DbError;

/// A row from the `listings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub product_id: i64,
    pub channel: String,
    /// Channel-native identifier; for Shopify, the first variant's id.
    pub listing_id: String,
    pub listing_url: Option<String>,
    /// `CHECK (inventory_count >= 0)` in the schema.
    pub inventory_count: i32,
    pub status: String,
    pub last_scrape_at: Option<DateTime<Utc>>,
}

impl ListingRow {
    /// Parses the stored `status` text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidListingStatus`] if the column holds a value
    /// outside the schema's `CHECK` list.
    pub fn status(&self) -> Result<ListingStatus, CoreError> {
        self.status.parse()
    }
}

/// Values written by [`upsert_listing`].
#[derive(Debug, Clone, Copy)]
pub struct NewListing<'a> {
    pub product_id: i64,
    pub channel: &'a str,
    pub listing_id: &'a str,
    pub listing_url: &'a str,
    pub inventory_count: i32,
    pub status: ListingStatus,
}

/// Upserts a listing keyed by `(channel, listing_id)`.
///
/// Conflicts update only the volatile columns: `inventory_count`, `status`,
/// and `last_scrape_at`. `product_id` and `listing_url` are fixed by the
/// first insert and never rewritten here.
///
/// Returns `true` if a new row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including a foreign-key
/// violation when `product_id` does not exist.
pub async fn upsert_listing<'e, E>(executor: E, listing: &NewListing<'_>) -> Result<bool, DbError>
where
    E: PgExecutor<'e>,
{
    let inserted = sqlx::query_scalar::<_, bool>(
        "INSERT INTO listings \
             (product_id, channel, listing_id, listing_url, inventory_count, status, last_scrape_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
         ON CONFLICT (channel, listing_id) DO UPDATE SET \
             inventory_count = EXCLUDED.inventory_count, \
             status          = EXCLUDED.status, \
             last_scrape_at  = NOW() \
         RETURNING (xmax = 0) AS inserted",
    )
    .bind(listing.product_id)
    .bind(listing.channel)
    .bind(listing.listing_id)
    .bind(listing.listing_url)
    .bind(listing.inventory_count)
    .bind(listing.status.as_str())
    .fetch_one(executor)
    .await?;

    Ok(inserted)
}

/// Fetches a listing by its composite key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_listing<'e, E>(
    executor: E,
    channel: &str,
    listing_id: &str,
) -> Result<Option<ListingRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ListingRow>(
        "SELECT id, product_id, channel, listing_id, listing_url, inventory_count, \
                status, last_scrape_at \
         FROM listings \
         WHERE channel = $1 AND listing_id = $2",
    )
    .bind(channel)
    .bind(listing_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}
