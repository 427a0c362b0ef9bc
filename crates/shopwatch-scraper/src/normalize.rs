//! Normalization from raw storefront types to [`shopwatch_core::Product`].

use chrono::{DateTime, FixedOffset};
use shopwatch_core::Product;

use crate::types::{ShopifyProduct, VariantPrice};

/// Builds the canonical product page URL for `handle` under `store_url`.
#[must_use]
pub fn product_url(store_url: &str, handle: &str) -> String {
    format!("{}/products/{handle}", store_url.trim_end_matches('/'))
}

/// Truncates a decimal price string to its whole part.
///
/// `"1100.00"` → `1100`, `"980.5"` → `980`. Returns `None` when the whole
/// part is not an integer.
#[must_use]
pub fn parse_price(raw: &str) -> Option<i64> {
    let whole = raw.trim().split('.').next().unwrap_or_default();
    if whole.is_empty() {
        return None;
    }
    whole.parse::<i64>().ok()
}

/// Normalizes a raw [`ShopifyProduct`] into a [`Product`].
///
/// Price and availability come from the first variant; a product without
/// variants is recorded at price `0` and unavailable. The first image wins,
/// falling back to `placeholder_image_url`.
#[must_use]
pub fn normalize_product(
    product: ShopifyProduct,
    store_url: &str,
    placeholder_image_url: &str,
    observed_at: DateTime<FixedOffset>,
) -> Product {
    let url = product_url(store_url, &product.handle);

    let (price, available) = match product.variants.first() {
        Some(variant) => {
            let price = variant
                .price
                .as_ref()
                .and_then(VariantPrice::whole)
                .unwrap_or_else(|| {
                    tracing::warn!(
                        url = %url,
                        raw_price = ?variant.price,
                        "missing or unparseable variant price; recording 0"
                    );
                    0
                });
            (price, variant.available)
        }
        None => (0, false),
    };

    let image_url = product
        .images
        .into_iter()
        .filter_map(|image| image.src)
        .find(|src| !src.is_empty())
        .unwrap_or_else(|| placeholder_image_url.to_string());

    Product {
        url,
        name: product.title,
        price,
        available,
        tags: product.tags,
        image_url,
        last_seen: observed_at,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
