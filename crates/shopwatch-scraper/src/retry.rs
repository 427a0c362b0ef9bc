//! Whole-fetch retry for the catalog scraper.
//!
//! A catalog fetch is all-or-nothing, so retries wrap the entire paginated
//! fetch rather than a single page. The delay between attempts is fixed.
//! Configuration-class errors are propagated immediately without retrying.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` may succeed on a fresh attempt.
///
/// Non-retriable errors (propagated immediately):
/// - [`ScraperError::InvalidStoreUrl`]: the configured URL will not change between attempts.
/// - [`ScraperError::PaginationLimit`]: guard against runaway pagination; not transient.
///
/// Everything else (network failures, timeouts, 429, 5xx, 404 from a
/// storefront mid-deploy, truncated JSON bodies) is treated as transient.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    !matches!(
        err,
        ScraperError::InvalidStoreUrl { .. } | ScraperError::PaginationLimit { .. }
    )
}

/// Executes `operation`, retrying up to `max_retries` additional times with
/// a fixed `delay` between attempts.
///
/// With `max_retries = 3` the operation is attempted at most 4 times total.
/// If all retries are exhausted the last error is returned.
pub(crate) async fn retry_with_fixed_delay<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "catalog fetch failed; retrying after delay"
                );
            }
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
