//! The reconciliation cycle.

mod ledger;
mod queries;
mod reconcile;
mod retention;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use shopwatch_core::{classify, url_set, AppConfig, CanonicalTz, CycleReport, Product};
use shopwatch_db::DbError;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::CycleError;
use crate::ports::{CatalogSource, MonitorStore};

/// Tunables for one [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub timezone: CanonicalTz,
    /// Number of catalog fetches that must agree before a diff is trusted.
    pub verify_passes: usize,
    pub verify_delay: Duration,
    /// Probe delisted candidates by URL before recording them.
    pub probe_delisted: bool,
    pub probe_concurrency: usize,
    pub event_write_concurrency: usize,
    pub typed_retention_days: u32,
    pub ledger_retention_days: u32,
    /// Image recorded on a delisted event when the snapshot has none.
    pub placeholder_image_url: String,
}

impl MonitorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timezone: config.timezone,
            verify_passes: config.verify_passes,
            verify_delay: Duration::from_secs(config.verify_delay_secs),
            probe_delisted: config.probe_delisted,
            probe_concurrency: config.probe_concurrency,
            event_write_concurrency: config.event_write_concurrency,
            typed_retention_days: config.typed_retention_days,
            ledger_retention_days: config.ledger_retention_days,
            placeholder_image_url: config.placeholder_image_url.clone(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            timezone: CanonicalTz::default(),
            verify_passes: 3,
            verify_delay: Duration::from_secs(5),
            probe_delisted: true,
            probe_concurrency: 20,
            event_write_concurrency: 50,
            typed_retention_days: 7,
            ledger_retention_days: 30,
            placeholder_image_url: shopwatch_core::app_config::DEFAULT_PLACEHOLDER_IMAGE_URL
                .to_string(),
        }
    }
}

/// Reconciles one storefront catalog against persisted state.
///
/// Holds no mutable state of its own; concurrent calls to
/// [`Monitor::run_cycle`] must be prevented by the caller.
pub struct Monitor<C, S, K> {
    source: C,
    store: S,
    clock: K,
    settings: MonitorSettings,
}

impl<C, S, K> Monitor<C, S, K>
where
    C: CatalogSource,
    S: MonitorStore,
    K: Clock,
{
    pub fn new(source: C, store: S, clock: K, settings: MonitorSettings) -> Self {
        Self {
            source,
            store,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.settings.timezone.normalize(&self.clock.now())
    }

    /// Runs one full check cycle.
    ///
    /// Nothing is written until every verification pass has returned the same
    /// non-empty URL set. After that, per-record write failures are logged and
    /// skipped, and pruning failures never fail the cycle.
    ///
    /// # Errors
    ///
    /// - [`CycleError::FetchFailed`]: a pass failed or returned an empty catalog.
    /// - [`CycleError::Inconsistent`]: passes disagreed; the cycle is discarded.
    /// - [`CycleError::Unexpected`]: the store is unreachable.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let cycle_id = Uuid::new_v4();
        tracing::info!(%cycle_id, "reconciliation cycle started");

        let baseline = self
            .store
            .load_snapshot()
            .await
            .map_err(|e| CycleError::store("load snapshot", &e))?;

        let (live, url_sets) = self.verification_passes(cycle_id).await?;
        let classification = classify(&url_set(&baseline), &url_sets).map_err(|err| {
            tracing::warn!(%cycle_id, error = %err, "verification mismatch; discarding cycle");
            CycleError::from(err)
        })?;

        let checked_at = self.now();
        let today = checked_at.date_naive();

        let live_by_url: HashMap<&str, &Product> =
            live.iter().map(|p| (p.url.as_str(), p)).collect();
        let baseline_by_url: HashMap<&str, &Product> =
            baseline.iter().map(|p| (p.url.as_str(), p)).collect();

        let new_products: Vec<&Product> = classification
            .new_urls
            .iter()
            .filter_map(|url| live_by_url.get(url.as_str()).copied())
            .collect();
        let candidates: Vec<&Product> = classification
            .delisted_urls
            .iter()
            .filter_map(|url| baseline_by_url.get(url.as_str()).copied())
            .collect();

        let new_outcome = self.record_new_listings(&new_products, checked_at).await?;
        let (confirmed, unconfirmed) = self.confirm_delisted(candidates).await;
        let delisted = self.record_delisted(&confirmed, checked_at).await?;

        let confirmed_urls: Vec<String> = confirmed.iter().map(|p| p.url.clone()).collect();
        self.reconcile_snapshot(&baseline_by_url, &live, &confirmed_urls)
            .await?;
        let reappeared: HashSet<&str> =
            new_outcome.restocks.iter().map(|l| l.url.as_str()).collect();
        self.sync_restocks(&live, &reappeared, today, checked_at).await?;
        self.prune(today).await;

        let report = CycleReport {
            cycle_id,
            checked_at,
            is_first_run: classification.is_first_run,
            new_listings: new_outcome.listings,
            delisted,
            restock_listings: new_outcome.restocks,
            unconfirmed_missing: unconfirmed.iter().map(|p| p.listing()).collect(),
            total_count: live.len(),
        };

        tracing::info!(
            %cycle_id,
            is_first_run = report.is_first_run,
            total = report.total_count,
            new = report.new_listings.len(),
            restocked = report.restock_listings.len(),
            delisted = report.delisted.len(),
            unconfirmed = report.unconfirmed_missing.len(),
            "reconciliation cycle completed"
        );

        Ok(report)
    }

    /// Fetches the catalog `verify_passes` times, returning the last fetch and
    /// the URL set of every pass. A failed or empty pass ends the cycle early.
    async fn verification_passes(
        &self,
        cycle_id: Uuid,
    ) -> Result<(Vec<Product>, Vec<BTreeSet<String>>), CycleError> {
        let passes = self.settings.verify_passes.max(1);
        let mut url_sets: Vec<BTreeSet<String>> = Vec::with_capacity(passes);
        let mut latest: Vec<Product> = Vec::new();

        for pass in 1..=passes {
            if pass > 1 && !self.settings.verify_delay.is_zero() {
                tokio::time::sleep(self.settings.verify_delay).await;
            }

            let catalog = self
                .source
                .fetch_catalog(self.now())
                .await
                .map_err(|e| CycleError::fetch(pass, &e))?;

            if catalog.is_empty() {
                return Err(CycleError::FetchFailed {
                    message: format!("verification pass {pass} returned an empty catalog"),
                });
            }

            tracing::debug!(%cycle_id, pass, count = catalog.len(), "verification pass fetched");
            url_sets.push(url_set(&catalog));
            latest = catalog;
        }

        Ok((latest, url_sets))
    }
}

/// Splits a per-record store failure into "skip" or "abort the cycle".
///
/// Connectivity failures abort; anything else is logged and the record is skipped.
fn tolerate<T>(stage: &'static str, url: &str, result: Result<T, DbError>) -> Result<Option<T>, CycleError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_connectivity() => {
            tracing::error!(stage, url, error = %e, "store unreachable; aborting cycle");
            Err(CycleError::store(stage, &e))
        }
        Err(e) => {
            tracing::warn!(stage, url, error = %e, "store write failed; skipping record");
            Ok(None)
        }
    }
}
