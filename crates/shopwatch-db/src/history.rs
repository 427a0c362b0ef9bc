//! Database operations for the history ledgers.
//!
//! Every event is written to the unified `history_events` ledger and to the
//! type-partitioned ledger for its kind (`new_listings` or
//! `delisted_listings`). Both enforce one event per URL per calendar day
//! through unique constraints, so the daily dedup check and the insert are a
//! single atomic statement.

use chrono::{DateTime, NaiveDate, Utc};
use shopwatch_core::{CanonicalTz, EventType, HistoryEvent};
use sqlx::PgPool;

use crate::DbError;

/// A row from `history_events`, `new_listings`, or `delisted_listings`.
///
/// The typed ledgers have no `event_type` column; their queries select it as
/// a literal so all three share this row type.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryEventRow {
    pub event_date: NaiveDate,
    pub event_type: String,
    pub recorded_at: DateTime<Utc>,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub price: Option<i64>,
    pub available: Option<bool>,
    pub tags: Vec<String>,
    pub is_restock: bool,
}

impl HistoryEventRow {
    /// Converts the row into a [`HistoryEvent`] with `time` in the canonical timezone.
    ///
    /// `table` names the ledger the row was read from, for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if `event_type` is not a known kind.
    pub fn into_event(self, table: &'static str, tz: CanonicalTz) -> Result<HistoryEvent, DbError> {
        let event_type = self
            .event_type
            .parse::<EventType>()
            .map_err(|reason| DbError::InvalidRow { table, reason })?;

        Ok(HistoryEvent {
            date: self.event_date,
            time: tz.normalize(&self.recorded_at),
            event_type,
            name: self.name,
            url: self.url,
            image_url: self.image_url,
            price: self.price,
            available: self.available,
            tags: self.tags,
            is_restock: self.is_restock,
        })
    }
}

/// Name of the unified ledger table.
pub const UNIFIED_TABLE: &str = "history_events";

/// Name of the type-partitioned ledger table for `event_type`.
#[must_use]
pub fn typed_table(event_type: EventType) -> &'static str {
    match event_type {
        EventType::New => "new_listings",
        EventType::Delisted => "delisted_listings",
    }
}

/// Records `event` in the unified ledger and in its typed ledger.
///
/// Both inserts run in one transaction and each is skipped when the ledger
/// already holds an event for the same URL, kind, and day. Returns `true`
/// if at least one ledger gained a row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either insert or the commit fails.
pub async fn insert_history_event(pool: &PgPool, event: &HistoryEvent) -> Result<bool, DbError> {
    let mut tx = pool.begin().await?;

    let unified_id: Option<i64> = sqlx::query_scalar::<_, i64>(
        "INSERT INTO history_events \
             (event_date, event_type, recorded_at, name, url, image_url, \
              price, available, tags, is_restock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (url, event_type, event_date) DO NOTHING \
         RETURNING id",
    )
    .bind(event.date)
    .bind(event.event_type.as_str())
    .bind(event.time)
    .bind(&event.name)
    .bind(&event.url)
    .bind(&event.image_url)
    .bind(event.price)
    .bind(event.available)
    .bind(&event.tags)
    .bind(event.is_restock)
    .fetch_optional(&mut *tx)
    .await?;

    let typed_sql = format!(
        "INSERT INTO {} \
             (event_date, recorded_at, name, url, image_url, price, available, tags, is_restock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (url, event_date) DO NOTHING \
         RETURNING id",
        typed_table(event.event_type)
    );
    let typed_id: Option<i64> = sqlx::query_scalar::<_, i64>(&typed_sql)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.name)
        .bind(&event.url)
        .bind(&event.image_url)
        .bind(event.price)
        .bind(event.available)
        .bind(&event.tags)
        .bind(event.is_restock)
        .fetch_optional(&mut *tx)
        .await?;

    tx.commit().await?;

    if unified_id.is_none() && typed_id.is_none() {
        tracing::debug!(
            url = %event.url,
            event_type = event.event_type.as_str(),
            date = %event.date,
            "event already recorded for this day; skipped"
        );
    }

    Ok(unified_id.is_some() || typed_id.is_some())
}

/// Returns `true` if the typed delisted ledger still holds a record for `url`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_delisted_listing(pool: &PgPool, url: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM delisted_listings WHERE url = $1)",
    )
    .bind(url)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Removes every typed delisted record for `url`. The unified ledger is untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_delisted_listings_for_url(pool: &PgPool, url: &str) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM delisted_listings WHERE url = $1")
        .bind(url)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Lists one day of events from the typed ledger for `event_type`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_listings_for_day(
    pool: &PgPool,
    event_type: EventType,
    date: NaiveDate,
) -> Result<Vec<HistoryEventRow>, DbError> {
    let sql = format!(
        "SELECT event_date, $1::TEXT AS event_type, recorded_at, name, url, image_url, \
                price, available, tags, is_restock \
         FROM {} \
         WHERE event_date = $2 \
         ORDER BY recorded_at, name",
        typed_table(event_type)
    );

    let rows = sqlx::query_as::<_, HistoryEventRow>(&sql)
        .bind(event_type.as_str())
        .bind(date)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Lists unified-ledger events of `event_type` with `start <= event_date <= end`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_history_events_in_range(
    pool: &PgPool,
    event_type: EventType,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HistoryEventRow>, DbError> {
    let rows = sqlx::query_as::<_, HistoryEventRow>(
        "SELECT event_date, event_type, recorded_at, name, url, image_url, \
                price, available, tags, is_restock \
         FROM history_events \
         WHERE event_type = $1 AND event_date BETWEEN $2 AND $3 \
         ORDER BY event_date, recorded_at, name",
    )
    .bind(event_type.as_str())
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes typed-ledger records dated before `cutoff`. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn prune_listings_before(
    pool: &PgPool,
    event_type: EventType,
    cutoff: NaiveDate,
) -> Result<u64, DbError> {
    let sql = format!(
        "DELETE FROM {} WHERE event_date < $1",
        typed_table(event_type)
    );
    let result = sqlx::query(&sql).bind(cutoff).execute(pool).await?;

    Ok(result.rows_affected())
}

/// Deletes unified-ledger records dated before `cutoff`. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn prune_history_events_before(pool: &PgPool, cutoff: NaiveDate) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM history_events WHERE event_date < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
