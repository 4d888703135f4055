use std::future::Future;

use shopsync_shopify::{RawProduct, ShopifyAdminClient, ShopifyError};

/// Where a sync run reads the remote catalog from.
pub trait CatalogSource: Send + Sync {
    /// Returns the complete catalog or an error; never a partial list.
    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<RawProduct>, ShopifyError>> + Send;

    /// Store host used to build listing URLs.
    fn store_host(&self) -> &str;
}

impl CatalogSource for ShopifyAdminClient {
    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<RawProduct>, ShopifyError>> + Send {
        self.fetch_all_products()
    }

    fn store_host(&self) -> &str {
        ShopifyAdminClient::store_host(self)
    }
}
