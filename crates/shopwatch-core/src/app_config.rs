use crate::time::CanonicalTz;

/// Default storefront root: `products.json` and product pages live under it.
pub const DEFAULT_STORE_URL: &str = "https://chiikawamarket.jp/zh-hant";

/// Image used when the storefront returns a product without images and no
/// earlier snapshot image is known.
pub const DEFAULT_PLACEHOLDER_IMAGE_URL: &str =
    "https://chiikawamarket.jp/cdn/shop/files/no-image.png";

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub store_url: String,
    pub placeholder_image_url: String,
    pub timezone: CanonicalTz,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_probe_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_page_size: u32,
    pub scraper_inter_page_delay_ms: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_delay_secs: u64,
    pub verify_passes: usize,
    pub verify_delay_secs: u64,
    pub probe_delisted: bool,
    pub probe_concurrency: usize,
    pub event_write_concurrency: usize,
    pub typed_retention_days: u32,
    pub ledger_retention_days: u32,
    pub cycle_max_attempts: u32,
    pub cycle_retry_delay_secs: u64,
    pub schedule: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("store_url", &self.store_url)
            .field("placeholder_image_url", &self.placeholder_image_url)
            .field("timezone", &self.timezone)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_probe_timeout_secs", &self.scraper_probe_timeout_secs)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_page_size", &self.scraper_page_size)
            .field(
                "scraper_inter_page_delay_ms",
                &self.scraper_inter_page_delay_ms,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field("scraper_retry_delay_secs", &self.scraper_retry_delay_secs)
            .field("verify_passes", &self.verify_passes)
            .field("verify_delay_secs", &self.verify_delay_secs)
            .field("probe_delisted", &self.probe_delisted)
            .field("probe_concurrency", &self.probe_concurrency)
            .field("event_write_concurrency", &self.event_write_concurrency)
            .field("typed_retention_days", &self.typed_retention_days)
            .field("ledger_retention_days", &self.ledger_retention_days)
            .field("cycle_max_attempts", &self.cycle_max_attempts)
            .field("cycle_retry_delay_secs", &self.cycle_retry_delay_secs)
            .field("schedule", &self.schedule)
            .finish()
    }
}
