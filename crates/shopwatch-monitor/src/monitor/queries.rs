//! Read-only operations consumed by bot commands.

use chrono::{Days, NaiveDate};
use shopwatch_core::{EventType, HistoryEvent, Product, RestockEntry};
use shopwatch_db::DbError;

use super::Monitor;
use crate::clock::Clock;
use crate::ports::{CatalogSource, MonitorStore};

impl<C, S, K> Monitor<C, S, K>
where
    C: CatalogSource,
    S: MonitorStore,
    K: Clock,
{
    /// The current snapshot, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    pub async fn get_current_catalog(&self) -> Result<Vec<Product>, DbError> {
        self.store.load_snapshot().await
    }

    /// Events of `event_type` on `date`, from the 7-day typed ledger.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    pub async fn get_events_for_day(
        &self,
        event_type: EventType,
        date: NaiveDate,
    ) -> Result<Vec<HistoryEvent>, DbError> {
        self.store.events_for_day(event_type, date).await
    }

    /// Events of `event_type` dated `start..=end`, from the 30-day unified ledger.
    ///
    /// An inverted range yields no events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    pub async fn get_events_in_range(
        &self,
        event_type: EventType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryEvent>, DbError> {
        if start > end {
            return Ok(Vec::new());
        }
        self.store.events_in_range(event_type, start, end).await
    }

    /// Pending restocks dated today or later, optionally limited to the next
    /// `within_days` days (inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    pub async fn get_pending_restocks(
        &self,
        within_days: Option<u32>,
    ) -> Result<Vec<RestockEntry>, DbError> {
        let today = self.now().date_naive();
        let until = within_days.map(|days| {
            today
                .checked_add_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MAX)
        });
        self.store.pending_restocks(today, until).await
    }
}
