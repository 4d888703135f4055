//! Cursor pagination over the Admin API `Link` response header.
//!
//! Each page response may carry
//!
//! ```text
//! <https://acme.myshopify.com/admin/api/2025-04/products.json?limit=250&page_info=PREV>; rel="previous",
//! <https://acme.myshopify.com/admin/api/2025-04/products.json?limit=250&page_info=NEXT>; rel="next"
//! ```
//!
//! The last page has no `rel="next"` entry.

/// Returns the `page_info` cursor of the `rel="next"` link, if any.
///
/// `None` when the header is absent, has no next link, or the next link
/// carries no usable `page_info` value.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    link_header?
        .split(',')
        .filter_map(parse_link_value)
        .find(|(_, rel)| rel.split_ascii_whitespace().any(|r| r == "next"))
        .and_then(|(target, _)| page_info_of(target))
}

/// Splits one `<target>; rel="..."` entry into its target and `rel` value.
fn parse_link_value(entry: &str) -> Option<(&str, &str)> {
    let mut parts = entry.trim().split(';');
    let target = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?;

    let rel = parts.find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("rel")
            .then(|| value.trim().trim_matches('"'))
    })?;

    Some((target, rel))
}

fn page_info_of(target: &str) -> Option<String> {
    let url = reqwest::Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page_info")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
