//! Database operations for `products`.

use chrono::{DateTime, Utc};
use shopsync_core::NormalizedProduct;
use sqlx::PgExecutor;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub sku: String,
    pub title: String,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of [`upsert_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductUpsert {
    pub id: i64,
    /// `true` when the row was inserted, `false` when an existing SKU was updated.
    pub created: bool,
}

/// Upserts a product row keyed by `sku`.
///
/// Conflicts overwrite `title` and `brand` and refresh `updated_at`.
/// `created_at` keeps its original value. No merge: the last write wins.
///
/// `xmax = 0` holds only for a freshly inserted tuple, which is how the
/// insert/update distinction is read back without a second query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product<'e, E>(
    executor: E,
    product: &NormalizedProduct,
) -> Result<ProductUpsert, DbError>
where
    E: PgExecutor<'e>,
{
    let (id, created) = sqlx::query_as::<_, (i64, bool)>(
        "INSERT INTO products (sku, title, brand, created_at, updated_at) \
         VALUES ($1, $2, $3, NOW(), NOW()) \
         ON CONFLICT (sku) DO UPDATE SET \
             title      = EXCLUDED.title, \
             brand      = EXCLUDED.brand, \
             updated_at = NOW() \
         RETURNING id, (xmax = 0) AS inserted",
    )
    .bind(&product.sku)
    .bind(&product.title)
    .bind(&product.brand)
    .fetch_one(executor)
    .await?;

    Ok(ProductUpsert { id, created })
}

/// Resolves a SKU to the product's internal `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_id_by_sku<'e, E>(executor: E, sku: &str) -> Result<Option<i64>, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE sku = $1")
        .bind(sku)
        .fetch_optional(executor)
        .await?;
    Ok(id)
}

/// Fetches a full product row by SKU.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_sku<'e, E>(executor: E, sku: &str) -> Result<Option<ProductRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, sku, title, brand, created_at, updated_at \
         FROM products \
         WHERE sku = $1",
    )
    .bind(sku)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}
