//! [`CatalogSource`] for the live storefront client.

use chrono::{DateTime, FixedOffset};
use shopwatch_core::Product;
use shopwatch_scraper::{ScraperError, ShopifyClient};

use crate::ports::CatalogSource;

impl CatalogSource for ShopifyClient {
    async fn fetch_catalog(
        &self,
        observed_at: DateTime<FixedOffset>,
    ) -> Result<Vec<Product>, ScraperError> {
        ShopifyClient::fetch_catalog(self, observed_at).await
    }

    async fn probe(&self, url: &str) -> bool {
        self.is_product_reachable(url).await
    }
}
