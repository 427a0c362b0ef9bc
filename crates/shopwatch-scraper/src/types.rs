//! Storefront response types for the public `products.json` endpoint.
//!
//! ## Observed shape
//!
//! ### Pagination
//! The localized storefront (`/zh-hant/products.json`) accepts `page` and
//! `limit` query parameters. Past the last page it answers `{"products": []}`
//! with status 200, and some storefronts keep repeating the final page
//! instead, so callers must also stop when a page adds no unseen handle.
//!
//! ### Tags
//! A JSON array of strings. Restock announcements are tags such as
//! `"RE20250601"`. `#[serde(default)]` covers products without tags.
//!
//! ### `price` on variants
//! Usually a decimal string (`"1100.00"`). Some themes emit a bare number or
//! `null`, so [`VariantPrice`] accepts either and a missing price is `None`.
//!
//! ### `available` on variants
//! May be absent on older storefront themes. Defaults to `false` so that a
//! missing flag is never reported as in stock.
//!
//! ### `images`
//! Empty array when the product has no photos. Only `src` is read, and an
//! image without one is skipped rather than failing the page.

use serde::Deserialize;

/// Top-level response from `GET /products.json`.
#[derive(Debug, Deserialize)]
pub struct ShopifyProductsResponse {
    pub products: Vec<ShopifyProduct>,
}

/// A single product from the storefront listing.
#[derive(Debug, Deserialize)]
pub struct ShopifyProduct {
    /// Numeric product ID. Not used as a key; the handle is stable per product.
    #[serde(default)]
    pub id: Option<i64>,

    /// Display name of the product.
    #[serde(default)]
    pub title: String,

    /// URL slug for the product page. Products without one are skipped.
    #[serde(default)]
    pub handle: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub images: Vec<ShopifyImage>,

    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
}

/// A single purchasable variant of a [`ShopifyProduct`].
#[derive(Debug, Deserialize)]
pub struct ShopifyVariant {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub price: Option<VariantPrice>,

    /// Whether this variant is currently available for purchase.
    #[serde(default)]
    pub available: bool,
}

/// A product image.
#[derive(Debug, Deserialize)]
pub struct ShopifyImage {
    /// Canonical CDN URL.
    #[serde(default)]
    pub src: Option<String>,
}

/// A variant price as the storefront sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VariantPrice {
    Text(String),
    Number(f64),
}

impl VariantPrice {
    /// Whole part of the price, or `None` when it is not a usable number.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn whole(&self) -> Option<i64> {
        match self {
            VariantPrice::Text(raw) => crate::normalize::parse_price(raw),
            VariantPrice::Number(value) => {
                if !value.is_finite() || value.abs() >= 9.0e15 {
                    return None;
                }
                Some(value.trunc() as i64)
            }
        }
    }
}
