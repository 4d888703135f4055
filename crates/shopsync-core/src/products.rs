use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Channel name written to `listings.channel` for records synced from Shopify.
pub const SHOPIFY_CHANNEL: &str = "shopify";

/// A catalog record reduced to what the reconciler persists: one product row
/// keyed by `sku` and one listing row keyed by `(channel, listing_native_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    /// Remote catalog id, kept for logging and the listing URL.
    pub catalog_id: i64,
    /// First variant's SKU, or `SKU-<catalog_id>` when the upstream SKU is blank.
    pub sku: String,
    pub title: String,
    /// Shopify `vendor`, stored as `products.brand`.
    pub brand: Option<String>,
    pub channel: String,
    /// First variant's id, stringified.
    pub listing_native_id: String,
    pub listing_url: String,
    /// Sum of variant inventory, never negative.
    pub inventory_total: i32,
}

/// Listing lifecycle state, stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Inactive,
}

impl ListingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ListingStatus::Active),
            "inactive" => Ok(ListingStatus::Inactive),
            other => Err(CoreError::InvalidListingStatus(other.to_string())),
        }
    }
}
