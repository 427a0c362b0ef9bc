//! Caller-side retry of whole cycles.

use std::time::Duration;

use shopwatch_core::CycleReport;

use crate::clock::Clock;
use crate::error::CycleError;
use crate::monitor::Monitor;
use crate::ports::{CatalogSource, MonitorStore};

/// Runs a cycle, re-running it up to `max_attempts` times in total on
/// [`CycleError::Unexpected`].
///
/// `FetchFailed` has already been retried by the fetcher and `Inconsistent`
/// must wait for the next scheduled cycle, so both are returned immediately.
///
/// # Errors
///
/// Returns the last [`CycleError`].
pub async fn run_cycle_with_retry<C, S, K>(
    monitor: &Monitor<C, S, K>,
    max_attempts: u32,
    delay: Duration,
) -> Result<CycleReport, CycleError>
where
    C: CatalogSource,
    S: MonitorStore,
    K: Clock,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match monitor.run_cycle().await {
            Ok(report) => return Ok(report),
            Err(err @ CycleError::Unexpected { .. }) if attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "cycle failed unexpectedly; retrying after delay"
                );
            }
            Err(err) => {
                tracing::error!(attempt, kind = err.kind().as_str(), error = %err, "cycle failed");
                return Err(err);
            }
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
