//! Normalization from raw Admin API products to [`shopsync_core::NormalizedProduct`].
//!
//! Pure: no I/O, no clock.

use shopsync_core::{NormalizedProduct, SHOPIFY_CHANNEL};

use crate::error::ShopifyError;
use crate::types::{RawProduct, RawVariant};

/// Normalizes one raw product into the shape the reconciler persists.
///
/// The first variant supplies both the SKU and the listing identity, so
/// reordering variants in Shopify admin moves the product to a new listing
/// row on the next sync.
///
/// # Errors
///
/// Returns [`ShopifyError::MalformedRecord`] if the product has no
/// `variants` array or the array is empty.
pub fn normalize_product(
    product: &RawProduct,
    store_host: &str,
) -> Result<NormalizedProduct, ShopifyError> {
    let variants = product
        .variants
        .as_deref()
        .ok_or_else(|| malformed(product.id, "product has no variants field"))?;
    let first = variants
        .first()
        .ok_or_else(|| malformed(product.id, "product has no variants"))?;

    Ok(NormalizedProduct {
        catalog_id: product.id,
        sku: derive_sku(first, product.id),
        title: product.title.clone().unwrap_or_default(),
        brand: product
            .vendor
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned),
        channel: SHOPIFY_CHANNEL.to_owned(),
        listing_native_id: first.id.to_string(),
        listing_url: listing_url(store_host, product.id),
        inventory_total: total_inventory(variants),
    })
}

/// The first variant's SKU verbatim, or `SKU-<catalog_id>` when it is
/// missing or only whitespace.
#[must_use]
pub fn derive_sku(first_variant: &RawVariant, catalog_id: i64) -> String {
    match first_variant.sku.as_deref() {
        Some(sku) if !sku.trim().is_empty() => sku.to_owned(),
        _ => format!("SKU-{catalog_id}"),
    }
}

/// Sums variant inventory for the listing's `inventory_count`.
///
/// Clamped per variant: an oversold variant contributes zero rather than
/// cancelling stock held by its siblings, so `[3, 5, -2]` totals `8`.
/// Missing quantities count as zero. The result fits `0..=i32::MAX`.
#[must_use]
pub fn total_inventory(variants: &[RawVariant]) -> i32 {
    let total = variants
        .iter()
        .map(|v| v.inventory_quantity.unwrap_or(0).max(0))
        .fold(0i64, i64::saturating_add);
    i32::try_from(total).unwrap_or(i32::MAX)
}

#[must_use]
pub fn listing_url(store_host: &str, catalog_id: i64) -> String {
    format!("https://{store_host}/admin/products/{catalog_id}")
}

fn malformed(catalog_id: i64, reason: &str) -> ShopifyError {
    ShopifyError::MalformedRecord {
        catalog_id,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
