//! Store domain handling for the Admin API client.

use crate::error::ShopifyError;

/// Resolves the configured store domain to a scheme+host origin.
///
/// `"acme.myshopify.com"` becomes `"https://acme.myshopify.com"`. A value
/// that already carries a scheme keeps it, which is how tests point the
/// client at a local mock server. Any path is dropped.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidStoreDomain`] if the value is blank, does
/// not parse as a URL host, or uses a scheme other than http(s).
pub fn store_origin(domain: &str) -> Result<reqwest::Url, ShopifyError> {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid(domain, "domain is empty"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = reqwest::Url::parse(&candidate).map_err(|e| invalid(domain, &e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(domain, "scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(domain, "no host"));
    }

    let origin = url.origin().ascii_serialization();
    reqwest::Url::parse(&origin).map_err(|e| invalid(domain, &e.to_string()))
}

/// Host (and non-default port) of an origin, used to build listing URLs.
pub(super) fn host_of(origin: &reqwest::Url) -> String {
    let host = origin.host_str().unwrap_or_default();
    match origin.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    }
}

fn invalid(domain: &str, reason: &str) -> ShopifyError {
    ShopifyError::InvalidStoreDomain {
        domain: domain.to_owned(),
        reason: reason.to_owned(),
    }
}
