use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use shopwatch_core::Product;

use crate::error::ScraperError;
use crate::normalize::normalize_product;
use crate::retry::retry_with_fixed_delay;

use super::{ShopifyClient, MAX_PAGES};

impl ShopifyClient {
    /// Fetches the full catalog, retrying the whole paginated walk on failure.
    ///
    /// `observed_at` is stamped onto every product as `last_seen`. The result is
    /// all-or-nothing: a failure on any page discards the pages already read.
    ///
    /// # Errors
    ///
    /// Returns the last [`ScraperError`] once retries are exhausted, or
    /// immediately for non-retriable errors.
    pub async fn fetch_catalog(
        &self,
        observed_at: DateTime<FixedOffset>,
    ) -> Result<Vec<Product>, ScraperError> {
        retry_with_fixed_delay(
            self.options.max_retries,
            Duration::from_secs(self.options.retry_delay_secs),
            || self.fetch_catalog_once(observed_at),
        )
        .await
    }

    /// Walks `page=1, 2, …` once, without retrying.
    ///
    /// Stops at the first empty page, or at a page that contributes no handle
    /// not already seen (some storefronts repeat the last page indefinitely).
    /// Products with an empty handle are skipped; duplicate handles keep the
    /// first occurrence.
    ///
    /// # Errors
    ///
    /// Propagates any page error, or [`ScraperError::PaginationLimit`] after
    /// [`MAX_PAGES`] pages.
    async fn fetch_catalog_once(
        &self,
        observed_at: DateTime<FixedOffset>,
    ) -> Result<Vec<Product>, ScraperError> {
        let store_url = self.options.store_url.as_str();
        let inter_page_delay = Duration::from_millis(self.options.inter_page_delay_ms);
        let mut seen: HashSet<String> = HashSet::new();
        let mut products: Vec<Product> = Vec::new();

        for page in 1..=MAX_PAGES {
            if page > 1 && !inter_page_delay.is_zero() {
                tokio::time::sleep(inter_page_delay).await;
            }

            let raw_products = self.fetch_products_page(page).await?;
            if raw_products.is_empty() {
                tracing::debug!(store_url, page, total = products.len(), "reached empty page");
                return Ok(products);
            }

            let mut added = 0usize;
            for raw in raw_products {
                if raw.handle.is_empty() {
                    tracing::debug!(store_url, page, title = %raw.title, "skipping product without handle");
                    continue;
                }
                if !seen.insert(raw.handle.clone()) {
                    continue;
                }
                products.push(normalize_product(
                    raw,
                    store_url,
                    &self.options.placeholder_image_url,
                    observed_at,
                ));
                added += 1;
            }

            tracing::debug!(store_url, page, added, total = products.len(), "fetched catalog page");

            if added == 0 {
                return Ok(products);
            }
        }

        Err(ScraperError::PaginationLimit {
            store_url: store_url.to_owned(),
            max_pages: MAX_PAGES,
        })
    }
}
