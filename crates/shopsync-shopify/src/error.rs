use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by Admin API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// 401 or 403: the access token is missing, revoked, or lacks `read_products`.
    #[error("Admin API rejected the access token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("invalid store domain \"{domain}\": {reason}")]
    InvalidStoreDomain { domain: String, reason: String },

    #[error("malformed catalog record {catalog_id}: {reason}")]
    MalformedRecord { catalog_id: i64, reason: String },
}
