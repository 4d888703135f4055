//! Per-record reconcile: product upsert, product lookup, and listing upsert
//! committed as one transaction.

use shopsync_core::{ListingStatus, NormalizedProduct};
use sqlx::PgPool;

use crate::listings::{upsert_listing, NewListing};
use crate::products::{find_product_id_by_sku, upsert_product};
use crate::DbError;

/// What [`reconcile_product`] did with one normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Both halves committed.
    Applied {
        product_id: i64,
        product_created: bool,
        listing_created: bool,
    },
    /// The SKU did not resolve after the product upsert; nothing was committed.
    ProductMissing,
}

/// Upserts the product row and its listing row for one catalog record.
///
/// The lookup runs inside the same transaction as the product upsert, so it
/// sees the just-written SKU. Any error rolls the whole record back (the
/// transaction is dropped uncommitted), which keeps a failed listing write
/// from leaving a half-updated product behind.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if beginning, any statement, or committing fails.
pub async fn reconcile_product(
    pool: &PgPool,
    product: &NormalizedProduct,
) -> Result<UpsertOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let upserted = upsert_product(&mut *tx, product).await?;

    let Some(product_id) = find_product_id_by_sku(&mut *tx, &product.sku).await? else {
        tx.rollback().await?;
        return Ok(UpsertOutcome::ProductMissing);
    };

    let listing_created = upsert_listing(
        &mut *tx,
        &NewListing {
            product_id,
            channel: &product.channel,
            listing_id: &product.listing_native_id,
            listing_url: &product.listing_url,
            inventory_count: product.inventory_total,
            status: ListingStatus::Active,
        },
    )
    .await?;

    tx.commit().await?;

    Ok(UpsertOutcome::Applied {
        product_id,
        product_created: upserted.created,
        listing_created,
    })
}
