//! HTTP client for the storefront's public `products.json` endpoint.

mod fetch_all;
mod origin;
mod probe;

use std::time::Duration;

use reqwest::Client;
use shopwatch_core::AppConfig;

use crate::error::ScraperError;
use crate::types::{ShopifyProduct, ShopifyProductsResponse};

pub use origin::extract_store_origin;
// Re-export for test visibility via `use super::*`
#[cfg(test)]
use origin::extract_domain;

/// Maximum number of pages to fetch before returning an error.
/// Prevents infinite loops on storefronts that never return an empty page.
pub(super) const MAX_PAGES: u32 = 200;

const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
const ACCEPT_LANGUAGE: &str = "zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7,ja;q=0.6";

/// Settings for [`ShopifyClient`], usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Storefront root; `products.json` and product pages live under it.
    pub store_url: String,
    pub placeholder_image_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Timeout for a single reachability probe.
    pub probe_timeout_secs: u64,
    /// `limit` query parameter for each page.
    pub page_size: u32,
    pub inter_page_delay_ms: u64,
    /// Additional whole-fetch attempts after the first failure.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl ClientOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            store_url: config.store_url.clone(),
            placeholder_image_url: config.placeholder_image_url.clone(),
            user_agent: config.scraper_user_agent.clone(),
            request_timeout_secs: config.scraper_request_timeout_secs,
            probe_timeout_secs: config.scraper_probe_timeout_secs,
            page_size: config.scraper_page_size,
            inter_page_delay_ms: config.scraper_inter_page_delay_ms,
            max_retries: config.scraper_max_retries,
            retry_delay_secs: config.scraper_retry_delay_secs,
        }
    }
}

/// HTTP client for a single storefront catalog.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. A catalog fetch walks `page=1, 2, …` until the storefront
/// returns an empty page, and is retried as a whole on failure.
pub struct ShopifyClient {
    pub(super) client: Client,
    pub(super) options: ClientOptions,
}

impl ShopifyClient {
    /// Creates a `ShopifyClient` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidStoreUrl`] if `options.store_url` is not an
    /// absolute URL, or [`ScraperError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed (e.g., invalid TLS config).
    pub fn new(options: ClientOptions) -> Result<Self, ScraperError> {
        Self::products_url(&options.store_url, 1, options.page_size)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent.as_str())
            .build()?;
        Ok(Self { client, options })
    }

    /// Fetches one page of the catalog. Not retried; see
    /// [`Self::fetch_catalog`] for the retrying whole-catalog fetch.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429.
    /// - [`ScraperError::NotFound`]: HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ScraperError::Http`]: network, TLS, or timeout failure.
    /// - [`ScraperError::Deserialize`]: response body is not the expected JSON.
    pub async fn fetch_products_page(&self, page: u32) -> Result<Vec<ShopifyProduct>, ScraperError> {
        let store_url = &self.options.store_url;
        let url = Self::products_url(store_url, page, self.options.page_size)?;
        let referer = extract_store_origin(store_url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(reqwest::header::REFERER, format!("{referer}/"))
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(ScraperError::RateLimited {
                domain: origin::extract_domain(store_url),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound { url });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<ShopifyProductsResponse>(&body).map_err(|e| {
            ScraperError::Deserialize {
                context: format!("products page {page} from {store_url}"),
                source: e,
            }
        })?;

        Ok(parsed.products)
    }

    /// Builds the `products.json` URL for the given store, page, and page size.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidStoreUrl`] if `store_url` cannot be
    /// parsed as an absolute URL.
    fn products_url(store_url: &str, page: u32, limit: u32) -> Result<String, ScraperError> {
        let base = format!("{}/products.json", store_url.trim_end_matches('/'));
        let mut url = reqwest::Url::parse(&base).map_err(|e| ScraperError::InvalidStoreUrl {
            store_url: store_url.to_owned(),
            reason: e.to_string(),
        })?;

        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        Ok(url.to_string())
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
