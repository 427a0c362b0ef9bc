use std::time::Duration;

use super::ShopifyClient;

impl ShopifyClient {
    /// Returns `true` when a HEAD request to `url` answers `200 OK`.
    ///
    /// Redirects are followed. Any other status, a timeout, or a transport
    /// error counts as unreachable; probe failures are never propagated.
    pub async fn is_product_reachable(&self, url: &str) -> bool {
        let result = self
            .client
            .head(url)
            .timeout(Duration::from_secs(self.options.probe_timeout_secs))
            .send()
            .await;

        match result {
            Ok(response) => {
                let reachable = response.status() == reqwest::StatusCode::OK;
                tracing::debug!(url, status = response.status().as_u16(), reachable, "probed product page");
                reachable
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "product probe failed; treating as unreachable");
                false
            }
        }
    }
}
