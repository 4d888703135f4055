//! Full-catalog fetch loop for `ShopifyAdminClient`.

use std::time::Duration;

use crate::error::ShopifyError;
use crate::pagination::extract_next_cursor;
use crate::types::RawProduct;

use super::ShopifyAdminClient;
use super::MAX_PAGES;

impl ShopifyAdminClient {
    /// Fetches every product in the catalog by following `Link` cursors
    /// until no `rel="next"` link remains.
    ///
    /// The configured inter-request delay is applied before every page except
    /// the first.
    ///
    /// **All-or-nothing**: if any page fails, products from earlier pages are
    /// discarded and the error is returned. The reconciler never sees a
    /// partial catalog.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_products_page`].
    /// Returns [`ShopifyError::PaginationLimit`] if the catalog spans more
    /// than [`MAX_PAGES`] pages.
    pub async fn fetch_all_products(&self) -> Result<Vec<RawProduct>, ShopifyError> {
        let mut all_products: Vec<RawProduct> = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=MAX_PAGES {
            if page_number > 1 && self.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_request_delay_ms)).await;
            }

            let (page, link_header) = self.fetch_products_page(cursor.as_deref()).await?;
            tracing::debug!(
                store = %self.store_host,
                page = page_number,
                products = page.products.len(),
                "fetched products page"
            );
            all_products.extend(page.products);

            cursor = extract_next_cursor(link_header.as_deref());
            if cursor.is_none() {
                return Ok(all_products);
            }
        }

        Err(ShopifyError::PaginationLimit {
            max_pages: MAX_PAGES,
        })
    }
}
