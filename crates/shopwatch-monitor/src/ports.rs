//! Dependency seams for the orchestrator.
//!
//! - [`CatalogSource`]: the upstream storefront (fetch + per-URL probe)
//! - [`MonitorStore`]: snapshot, history ledgers, and pending restocks

use std::future::Future;

use chrono::{DateTime, FixedOffset, NaiveDate};
use shopwatch_core::{EventType, HistoryEvent, Product, RestockEntry};
use shopwatch_db::DbError;
use shopwatch_scraper::ScraperError;

/// Upstream catalog the monitor reconciles against.
pub trait CatalogSource: Send + Sync {
    /// Fetches the full catalog, stamping each product with `observed_at`.
    ///
    /// All-or-nothing: a partial catalog is never returned.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure once the source has given up retrying.
    fn fetch_catalog(
        &self,
        observed_at: DateTime<FixedOffset>,
    ) -> impl Future<Output = Result<Vec<Product>, ScraperError>> + Send;

    /// Returns `true` if the product page at `url` is still individually reachable.
    fn probe(&self, url: &str) -> impl Future<Output = bool> + Send;
}

/// Persistent state read and written by a cycle.
///
/// Timestamps returned by implementations carry the canonical offset.
pub trait MonitorStore: Send + Sync {
    /// Reads the whole snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn load_snapshot(&self) -> impl Future<Output = Result<Vec<Product>, DbError>> + Send;

    /// Inserts or replaces the snapshot record for `product.url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn upsert_snapshot_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Deletes the snapshot records for `urls`, returning how many existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_snapshot_products(
        &self,
        urls: &[String],
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Writes `event` to the unified and typed ledgers.
    ///
    /// Returns `false` when both ledgers already hold an event for the same
    /// URL, kind, and day.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn record_event(&self, event: &HistoryEvent)
        -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Returns `true` if the typed delisted ledger holds a record for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn has_delisted_record(&self, url: &str) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Removes typed delisted records for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn clear_delisted_records(&self, url: &str)
        -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Events of `event_type` on `date`, read from the typed ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn events_for_day(
        &self,
        event_type: EventType,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<HistoryEvent>, DbError>> + Send;

    /// Events of `event_type` dated `start..=end`, read from the unified ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn events_in_range(
        &self,
        event_type: EventType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<HistoryEvent>, DbError>> + Send;

    /// Purges typed-ledger records dated before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn prune_typed_events(
        &self,
        event_type: EventType,
        cutoff: NaiveDate,
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Purges unified-ledger records dated before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn prune_unified_events(&self, cutoff: NaiveDate)
        -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Inserts or refreshes a pending restock, keeping an existing `detected_date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn upsert_pending_restock(
        &self,
        entry: &RestockEntry,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Removes the pending restock for `url`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn remove_pending_restock(&self, url: &str)
        -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Pending restocks with `from <= next_resale_date <= until`, ordered by
    /// date then name. `until = None` leaves the window open-ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn pending_restocks(
        &self,
        from: NaiveDate,
        until: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<RestockEntry>, DbError>> + Send;

    /// Purges pending restocks whose date is before `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn prune_pending_restocks(&self, today: NaiveDate)
        -> impl Future<Output = Result<u64, DbError>> + Send;
}
