//! URL origin and domain extraction utilities for the storefront client.

/// Extracts the scheme+host origin from a store URL.
///
/// Given `"https://chiikawamarket.jp/zh-hant"`, returns `"https://chiikawamarket.jp"`.
/// Used as the `Referer` for catalog requests.
#[must_use]
pub fn extract_store_origin(store_url: &str) -> String {
    reqwest::Url::parse(store_url).map_or_else(
        |e| {
            tracing::warn!(
                store_url,
                error = %e,
                "could not parse store_url as URL; falling back to string split for origin extraction; check SHOPWATCH_STORE_URL"
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

/// Extracts the hostname from a store URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(super) fn extract_domain(store_url: &str) -> String {
    reqwest::Url::parse(store_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| store_url.to_owned())
}
