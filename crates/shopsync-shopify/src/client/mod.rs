//! HTTP client for the Shopify Admin REST `products.json` endpoint.

mod fetch_all;
mod store;

use std::time::Duration;

use reqwest::Client;
use shopsync_core::{config::MAX_SHOPIFY_PAGE_SIZE, AppConfig};

use crate::error::ShopifyError;
use crate::retry::retry_with_backoff;
use crate::types::ProductsPage;

pub use store::store_origin;

/// Maximum number of pages to fetch before returning an error.
/// Prevents infinite loops on cycling cursors.
///
/// Each page request may be retried up to `max_retries` times on transient
/// errors, so the worst-case request count is `MAX_PAGES * (1 + max_retries)`.
pub const MAX_PAGES: usize = 200;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// `Retry-After` fallback when a 429 omits the header. Shopify's REST
/// leaky bucket drains at two requests per second.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Connection and retry settings for [`ShopifyAdminClient`].
#[derive(Debug, Clone)]
pub struct AdminClientConfig {
    /// `acme.myshopify.com`, or a full origin such as `http://127.0.0.1:8080`.
    pub store_domain: String,
    pub access_token: String,
    pub api_version: String,
    /// Clamped to `1..=250`.
    pub page_size: u32,
    pub timeout_secs: u64,
    /// Additional attempts after the first failure; `0` disables retries.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Sleep between consecutive page requests.
    pub inter_request_delay_ms: u64,
}

impl AdminClientConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            store_domain: config.shopify_store_domain.clone(),
            access_token: config.shopify_access_token.clone(),
            api_version: config.shopify_api_version.clone(),
            page_size: config.shopify_page_size,
            timeout_secs: config.fetch_timeout_secs,
            max_retries: config.fetch_max_retries,
            retry_backoff_base_ms: config.fetch_retry_backoff_base_ms,
            inter_request_delay_ms: config.fetch_inter_request_delay_ms,
        }
    }
}

/// Authenticated client for one store's Admin API.
///
/// Maps 429 to [`ShopifyError::RateLimited`], 401/403 to
/// [`ShopifyError::Unauthorized`], and any other non-2xx response to
/// [`ShopifyError::UnexpectedStatus`]. Pagination cursors from the `Link`
/// header are returned alongside each page.
pub struct ShopifyAdminClient {
    pub(super) client: Client,
    pub(super) origin: reqwest::Url,
    pub(super) store_host: String,
    access_token: String,
    api_version: String,
    pub(super) page_size: u32,
    max_retries: u32,
    retry_backoff_base_ms: u64,
    pub(super) inter_request_delay_ms: u64,
}

impl std::fmt::Debug for ShopifyAdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAdminClient")
            .field("origin", &self.origin.as_str())
            .field("api_version", &self.api_version)
            .field("access_token", &"[redacted]")
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ShopifyAdminClient {
    /// Builds a client with the configured timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidStoreDomain`] if the store domain does
    /// not resolve to an origin, or [`ShopifyError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(config: &AdminClientConfig) -> Result<Self, ShopifyError> {
        let origin = store_origin(&config.store_domain)?;
        let store_host = store::host_of(&origin);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("shopsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            origin,
            store_host,
            access_token: config.access_token.clone(),
            api_version: config.api_version.clone(),
            page_size: config.page_size.clamp(1, MAX_SHOPIFY_PAGE_SIZE),
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            inter_request_delay_ms: config.inter_request_delay_ms,
        })
    }

    /// Store host used in listing URLs, e.g. `acme.myshopify.com`.
    #[must_use]
    pub fn store_host(&self) -> &str {
        &self.store_host
    }

    /// Fetches one page of products, retrying transient failures.
    ///
    /// Returns the page and the raw `Link` header, if present.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ShopifyError::Unauthorized`]: HTTP 401 or 403 (not retried).
    /// - [`ShopifyError::UnexpectedStatus`]: any other non-2xx (not retried).
    /// - [`ShopifyError::Http`]: transport failure after all retries.
    /// - [`ShopifyError::Deserialize`]: body is not a products page (not retried).
    pub async fn fetch_products_page(
        &self,
        page_info: Option<&str>,
    ) -> Result<(ProductsPage, Option<String>), ShopifyError> {
        let url = self.products_url(page_info)?;

        retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.as_str())
                    .header(ACCESS_TOKEN_HEADER, self.access_token.as_str())
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after)
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    return Err(ShopifyError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(ShopifyError::Unauthorized {
                        status: status.as_u16(),
                    });
                }

                if !status.is_success() {
                    return Err(ShopifyError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                // Read the Link header before the body consumes the response.
                let link_header = response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);

                let body = response.text().await?;
                let page = serde_json::from_str::<ProductsPage>(&body).map_err(|e| {
                    ShopifyError::Deserialize {
                        context: format!("products page from {}", self.store_host),
                        source: e,
                    }
                })?;

                Ok((page, link_header))
            }
        })
        .await
    }

    /// Builds `{origin}/admin/api/{version}/products.json?limit=N[&page_info=C]`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidStoreDomain`] if the API version makes
    /// the path unparseable.
    fn products_url(&self, page_info: Option<&str>) -> Result<reqwest::Url, ShopifyError> {
        let mut url = self
            .origin
            .join(&format!("admin/api/{}/products.json", self.api_version))
            .map_err(|e| ShopifyError::InvalidStoreDomain {
                domain: self.store_host.clone(),
                reason: format!("cannot build products URL: {e}"),
            })?;

        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string());
        if let Some(cursor) = page_info {
            url.query_pairs_mut().append_pair("page_info", cursor);
        }

        Ok(url)
    }
}

/// Parses `Retry-After` as (possibly fractional) seconds, rounding up.
/// Shopify sends values like `2.0`.
fn parse_retry_after(value: &str) -> Option<u64> {
    let secs = value.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(secs.ceil() as u64)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
