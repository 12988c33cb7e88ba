//! Origin and host extraction for configured store URLs.

/// Extracts the scheme+host origin from a store URL.
///
/// Given `"https://shop.example.com/collections/all"`, returns
/// `"https://shop.example.com"`. Catalog and lock requests always go to the
/// store root, whatever path the configured URL carries.
#[must_use]
pub fn extract_store_origin(store_url: &str) -> String {
    reqwest::Url::parse(store_url).map_or_else(
        |e| {
            tracing::warn!(
                store_url,
                error = %e,
                "could not parse store URL — falling back to string split for origin extraction"
            );
            store_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a URL for error messages and log fields.
///
/// Falls back to the full string if parsing fails.
pub(crate) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
