//! Snapshot diff-upsert and pending-restock sync.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, FixedOffset, NaiveDate};
use futures::stream::{self, StreamExt};
use shopwatch_core::{extract_restocks, Product};
use shopwatch_db::DbError;

use super::{tolerate, Monitor};
use crate::clock::Clock;
use crate::error::CycleError;
use crate::ports::{CatalogSource, MonitorStore};

/// `true` when `live` carries nothing the snapshot record lacks.
///
/// `last_seen` is ignored and tags compare as sets.
fn unchanged(stored: &Product, live: &Product) -> bool {
    stored.name == live.name
        && stored.price == live.price
        && stored.available == live.available
        && stored.image_url == live.image_url
        && stored.tags.iter().collect::<BTreeSet<_>>() == live.tags.iter().collect::<BTreeSet<_>>()
}

impl<C, S, K> Monitor<C, S, K>
where
    C: CatalogSource,
    S: MonitorStore,
    K: Clock,
{
    /// Brings the snapshot in line with the verified catalog.
    ///
    /// Confirmed delistings are deleted and new or changed products are
    /// upserted. Candidates that are still reachable are left in place, so
    /// they are re-examined next cycle.
    pub(super) async fn reconcile_snapshot(
        &self,
        baseline: &HashMap<&str, &Product>,
        live: &[Product],
        delisted_urls: &[String],
    ) -> Result<(), CycleError> {
        let deleted = tolerate(
            "delete delisted snapshot records",
            "",
            self.store.delete_snapshot_products(delisted_urls).await,
        )?
        .unwrap_or(0);

        let changed: Vec<&Product> = live
            .iter()
            .filter(|p| {
                baseline
                    .get(p.url.as_str())
                    .is_none_or(|stored| !unchanged(stored, p))
            })
            .collect();

        let results: Vec<(&Product, Result<(), DbError>)> = stream::iter(changed)
            .map(|product| async move { (product, self.store.upsert_snapshot_product(product).await) })
            .buffer_unordered(self.settings.event_write_concurrency.max(1))
            .boxed()
            .collect()
            .await;

        let mut upserted = 0usize;
        for (product, result) in results {
            if tolerate("upsert snapshot record", &product.url, result)?.is_some() {
                upserted += 1;
            }
        }

        tracing::info!(deleted, upserted, live = live.len(), "snapshot reconciled");
        Ok(())
    }

    /// Upserts pending restocks for live products with a tag dated today or
    /// later, and drops entries for live products that no longer carry one.
    ///
    /// Products in `reappeared` came back this cycle and had their entry
    /// cleared when the event was recorded; they are not re-added.
    pub(super) async fn sync_restocks(
        &self,
        live: &[Product],
        reappeared: &HashSet<&str>,
        today: NaiveDate,
        at: DateTime<FixedOffset>,
    ) -> Result<(), CycleError> {
        let mut entries = extract_restocks(live, today, at);
        entries.retain(|e| !reappeared.contains(e.url.as_str()));
        let tagged: HashSet<&str> = entries.iter().map(|e| e.url.as_str()).collect();

        let mut upserted = 0usize;
        for entry in &entries {
            let result = self.store.upsert_pending_restock(entry).await;
            if tolerate("upsert pending restock", &entry.url, result)?.is_some() {
                upserted += 1;
            }
        }

        let Some(existing) = tolerate(
            "list pending restocks",
            "",
            self.store.pending_restocks(today, None).await,
        )?
        else {
            return Ok(());
        };
        let existing: HashSet<&str> = existing.iter().map(|e| e.url.as_str()).collect();

        let mut removed = 0usize;
        for product in live {
            let url = product.url.as_str();
            if tagged.contains(url) || reappeared.contains(url) || !existing.contains(url) {
                continue;
            }
            let result = self.store.remove_pending_restock(url).await;
            if tolerate("remove pending restock", url, result)?.unwrap_or(false) {
                removed += 1;
            }
        }

        tracing::info!(upserted, removed, "pending restocks synced");
        Ok(())
    }
}
