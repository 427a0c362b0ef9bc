//! End-of-cycle pruning. Failures are logged and never fail the cycle.

use chrono::NaiveDate;
use shopwatch_core::{CanonicalTz, EventType};

use super::Monitor;
use crate::clock::Clock;
use crate::ports::{CatalogSource, MonitorStore};

fn log_pruned(table: &'static str, cutoff: NaiveDate, result: Result<u64, shopwatch_db::DbError>) {
    match result {
        Ok(removed) => tracing::info!(table, %cutoff, removed, "pruned expired records"),
        Err(e) => tracing::warn!(table, %cutoff, error = %e, "pruning failed"),
    }
}

impl<C, S, K> Monitor<C, S, K>
where
    C: CatalogSource,
    S: MonitorStore,
    K: Clock,
{
    pub(super) async fn prune(&self, today: NaiveDate) {
        let typed_cutoff = CanonicalTz::retention_cutoff(today, self.settings.typed_retention_days);
        let ledger_cutoff = CanonicalTz::retention_cutoff(today, self.settings.ledger_retention_days);

        for event_type in [EventType::New, EventType::Delisted] {
            let table = match event_type {
                EventType::New => "new_listings",
                EventType::Delisted => "delisted_listings",
            };
            log_pruned(
                table,
                typed_cutoff,
                self.store.prune_typed_events(event_type, typed_cutoff).await,
            );
        }

        log_pruned(
            "history_events",
            ledger_cutoff,
            self.store.prune_unified_events(ledger_cutoff).await,
        );
        log_pruned(
            "pending_restocks",
            today,
            self.store.prune_pending_restocks(today).await,
        );
    }
}
