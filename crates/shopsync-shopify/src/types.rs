//! Admin API response types for `GET /admin/api/{version}/products.json`.
//!
//! Only the fields the normalizer reads are modelled; serde ignores the rest
//! of the (large) Admin product payload.
//!
//! `title` can come back `null` on draft products created through the API, so
//! it is optional here and defaulted to empty during normalization.
//!
//! `variants` is optional on purpose. A product that arrives without the
//! array is a bad record, not a bad page: it has to deserialize so the
//! normalizer can reject that one record and let the rest of the page through.

use serde::Deserialize;

/// Top-level response from `GET /products.json`.
#[derive(Debug, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<RawProduct>,
}

/// A single product as returned by the Admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    /// Shopify numeric product ID (e.g., `7012345678901`).
    pub id: i64,

    #[serde(default)]
    pub title: Option<String>,

    /// Vendor as configured in Shopify admin; stored as the product's brand.
    #[serde(default)]
    pub vendor: Option<String>,

    #[serde(default)]
    pub variants: Option<Vec<RawVariant>>,
}

/// A purchasable variant of a [`RawProduct`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawVariant {
    pub id: i64,

    /// May be `null` or an empty string on stores that do not use SKUs.
    #[serde(default)]
    pub sku: Option<String>,

    /// Tracked on-hand quantity. Negative when oversold, `null` when the
    /// variant does not track inventory.
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}
