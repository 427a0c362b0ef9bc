//! Database operations for `pending_restocks`.

use chrono::{DateTime, NaiveDate, Utc};
use shopwatch_core::{CanonicalTz, RestockEntry};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `pending_restocks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingRestockRow {
    pub url: String,
    pub name: String,
    pub price: i64,
    pub available: bool,
    pub tags: Vec<String>,
    pub resale_tags: Vec<String>,
    pub next_resale_date: NaiveDate,
    pub detected_date: NaiveDate,
    pub last_updated: DateTime<Utc>,
}

impl PendingRestockRow {
    #[must_use]
    pub fn into_entry(self, tz: CanonicalTz) -> RestockEntry {
        RestockEntry {
            url: self.url,
            name: self.name,
            price: self.price,
            available: self.available,
            tags: self.tags,
            resale_tags: self.resale_tags,
            next_resale_date: self.next_resale_date,
            detected_date: self.detected_date,
            last_updated: tz.normalize(&self.last_updated),
        }
    }
}

/// Upserts a pending-restock entry keyed by `url`.
///
/// Conflicts refresh everything except `detected_date`, which keeps the day
/// the entry was first seen.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_pending_restock(pool: &PgPool, entry: &RestockEntry) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO pending_restocks \
             (url, name, price, available, tags, resale_tags, \
              next_resale_date, detected_date, last_updated) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (url) DO UPDATE SET \
             name             = EXCLUDED.name, \
             price            = EXCLUDED.price, \
             available        = EXCLUDED.available, \
             tags             = EXCLUDED.tags, \
             resale_tags      = EXCLUDED.resale_tags, \
             next_resale_date = EXCLUDED.next_resale_date, \
             last_updated     = EXCLUDED.last_updated",
    )
    .bind(&entry.url)
    .bind(&entry.name)
    .bind(entry.price)
    .bind(entry.available)
    .bind(&entry.tags)
    .bind(&entry.resale_tags)
    .bind(entry.next_resale_date)
    .bind(entry.detected_date)
    .bind(entry.last_updated)
    .execute(pool)
    .await?;

    Ok(())
}

/// Removes the entry for `url`. Returns `true` if one existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_pending_restock(pool: &PgPool, url: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM pending_restocks WHERE url = $1")
        .bind(url)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Lists entries with `from <= next_resale_date`, optionally bounded above
/// by `until` (inclusive), ordered by date then name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pending_restocks(
    pool: &PgPool,
    from: NaiveDate,
    until: Option<NaiveDate>,
) -> Result<Vec<PendingRestockRow>, DbError> {
    let rows = sqlx::query_as::<_, PendingRestockRow>(
        "SELECT url, name, price, available, tags, resale_tags, \
                next_resale_date, detected_date, last_updated \
         FROM pending_restocks \
         WHERE next_resale_date >= $1 \
           AND ($2::DATE IS NULL OR next_resale_date <= $2) \
         ORDER BY next_resale_date, name",
    )
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes entries whose `next_resale_date` is before `today`. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn prune_pending_restocks_before(pool: &PgPool, today: NaiveDate) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM pending_restocks WHERE next_resale_date < $1")
        .bind(today)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
