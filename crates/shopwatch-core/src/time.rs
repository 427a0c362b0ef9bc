//! Canonical timezone boundary.
//!
//! Every timestamp that crosses the storage edge, and every calendar-day
//! computation (daily event dedup, retention cutoffs, restock dates), goes
//! through [`CanonicalTz`]. Storage keeps `TIMESTAMPTZ` values in UTC; callers
//! only ever see timestamps carrying the canonical offset.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

use crate::ConfigError;

/// Fixed-offset timezone the monitor reports and buckets days in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalTz {
    offset: FixedOffset,
}

impl CanonicalTz {
    /// Builds a canonical timezone from a whole-hour UTC offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if `hours` is outside `-12..=14`.
    pub fn from_offset_hours(hours: i32) -> Result<Self, ConfigError> {
        if !(-12..=14).contains(&hours) {
            return Err(ConfigError::InvalidEnvVar {
                var: "SHOPWATCH_UTC_OFFSET_HOURS".to_string(),
                reason: format!("offset {hours} is outside -12..=14"),
            });
        }
        FixedOffset::east_opt(hours * 3600)
            .map(|offset| Self { offset })
            .ok_or_else(|| ConfigError::InvalidEnvVar {
                var: "SHOPWATCH_UTC_OFFSET_HOURS".to_string(),
                reason: format!("offset {hours} is not representable"),
            })
    }

    #[must_use]
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Converts any timezone-aware instant to the canonical offset.
    #[must_use]
    pub fn normalize<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// Calendar day of `at` in the canonical timezone.
    #[must_use]
    pub fn date_of<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> NaiveDate {
        self.normalize(at).date_naive()
    }

    /// Oldest calendar day a retention window of `days` keeps.
    ///
    /// Records dated strictly before the cutoff are older than `days` days
    /// and may be purged. With `days = 7` and `today = 2025-05-08` the cutoff
    /// is `2025-05-01`.
    #[must_use]
    pub fn retention_cutoff(today: NaiveDate, days: u32) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl Default for CanonicalTz {
    fn default() -> Self {
        Self::utc()
    }
}
