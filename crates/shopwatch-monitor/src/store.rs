//! [`MonitorStore`] backed by Postgres through `shopwatch-db`.

use chrono::NaiveDate;
use shopwatch_core::{CanonicalTz, EventType, HistoryEvent, Product, RestockEntry};
use shopwatch_db::DbError;
use sqlx::PgPool;

use crate::ports::MonitorStore;

/// Postgres store. Rows are converted to the canonical timezone on read.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    tz: CanonicalTz,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool, tz: CanonicalTz) -> Self {
        Self { pool, tz }
    }
}

impl MonitorStore for PgStore {
    async fn load_snapshot(&self) -> Result<Vec<Product>, DbError> {
        let rows = shopwatch_db::list_products(&self.pool).await?;
        Ok(rows.into_iter().map(|r| r.into_product(self.tz)).collect())
    }

    async fn upsert_snapshot_product(&self, product: &Product) -> Result<(), DbError> {
        shopwatch_db::upsert_product(&self.pool, product).await
    }

    async fn delete_snapshot_products(&self, urls: &[String]) -> Result<u64, DbError> {
        shopwatch_db::delete_products_by_url(&self.pool, urls).await
    }

    async fn record_event(&self, event: &HistoryEvent) -> Result<bool, DbError> {
        shopwatch_db::insert_history_event(&self.pool, event).await
    }

    async fn has_delisted_record(&self, url: &str) -> Result<bool, DbError> {
        shopwatch_db::has_delisted_listing(&self.pool, url).await
    }

    async fn clear_delisted_records(&self, url: &str) -> Result<u64, DbError> {
        shopwatch_db::delete_delisted_listings_for_url(&self.pool, url).await
    }

    async fn events_for_day(
        &self,
        event_type: EventType,
        date: NaiveDate,
    ) -> Result<Vec<HistoryEvent>, DbError> {
        let table = shopwatch_db::typed_table(event_type);
        shopwatch_db::list_listings_for_day(&self.pool, event_type, date)
            .await?
            .into_iter()
            .map(|r| r.into_event(table, self.tz))
            .collect()
    }

    async fn events_in_range(
        &self,
        event_type: EventType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryEvent>, DbError> {
        shopwatch_db::list_history_events_in_range(&self.pool, event_type, start, end)
            .await?
            .into_iter()
            .map(|r| r.into_event(shopwatch_db::UNIFIED_TABLE, self.tz))
            .collect()
    }

    async fn prune_typed_events(
        &self,
        event_type: EventType,
        cutoff: NaiveDate,
    ) -> Result<u64, DbError> {
        shopwatch_db::prune_listings_before(&self.pool, event_type, cutoff).await
    }

    async fn prune_unified_events(&self, cutoff: NaiveDate) -> Result<u64, DbError> {
        shopwatch_db::prune_history_events_before(&self.pool, cutoff).await
    }

    async fn upsert_pending_restock(&self, entry: &RestockEntry) -> Result<(), DbError> {
        shopwatch_db::upsert_pending_restock(&self.pool, entry).await
    }

    async fn remove_pending_restock(&self, url: &str) -> Result<bool, DbError> {
        shopwatch_db::delete_pending_restock(&self.pool, url).await
    }

    async fn pending_restocks(
        &self,
        from: NaiveDate,
        until: Option<NaiveDate>,
    ) -> Result<Vec<RestockEntry>, DbError> {
        let rows = shopwatch_db::list_pending_restocks(&self.pool, from, until).await?;
        Ok(rows.into_iter().map(|r| r.into_entry(self.tz)).collect())
    }

    async fn prune_pending_restocks(&self, today: NaiveDate) -> Result<u64, DbError> {
        shopwatch_db::prune_pending_restocks_before(&self.pool, today).await
    }
}
