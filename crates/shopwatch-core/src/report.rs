use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use crate::products::Listing;

/// Structured outcome of one successful reconciliation cycle.
///
/// This is everything the notifier layer needs to render a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Correlates the report with the cycle's log lines.
    pub cycle_id: Uuid,
    pub checked_at: DateTime<FixedOffset>,
    /// The snapshot was empty before this cycle; nothing was reported as new or delisted.
    pub is_first_run: bool,
    pub new_listings: Vec<Listing>,
    pub delisted: Vec<Listing>,
    /// Subset of `new_listings` that reappeared after a recorded delisting.
    pub restock_listings: Vec<Listing>,
    /// Missing from the catalog but still reachable by direct URL; not reported as delisted.
    pub unconfirmed_missing: Vec<Listing>,
    /// Number of products in the verified catalog.
    pub total_count: usize,
}

impl CycleReport {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.new_listings.is_empty() || !self.delisted.is_empty()
    }
}
