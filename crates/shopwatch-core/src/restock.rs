//! Restock tag extraction.
//!
//! The storefront announces restocks by tagging products with
//! `RE` followed by a `YYYYMMDD` date, e.g. `RE20250601`.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use thiserror::Error;

use crate::products::{Product, RestockEntry};

static RESTOCK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RE(\d{8})$").expect("valid restock tag regex"));

/// A tag shaped like a restock tag whose digits are not a calendar date.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("restock tag \"{tag}\" does not encode a valid date")]
pub struct TagParseError {
    pub tag: String,
}

/// Parses a single tag.
///
/// Returns `Ok(None)` for tags that are not restock tags at all.
///
/// # Errors
///
/// Returns [`TagParseError`] when the tag has the restock shape but the
/// digits are not a valid `YYYYMMDD` date (e.g. `RE20250231`).
pub fn parse_restock_tag(tag: &str) -> Result<Option<NaiveDate>, TagParseError> {
    let Some(caps) = RESTOCK_TAG.captures(tag.trim()) else {
        return Ok(None);
    };
    let digits = &caps[1];
    NaiveDate::parse_from_str(digits, "%Y%m%d")
        .map(Some)
        .map_err(|_| TagParseError {
            tag: tag.to_string(),
        })
}

/// Returns the restock-date tags of `tags` and the earliest date that is
/// `today` or later.
///
/// Malformed restock tags are logged and skipped. Returns `None` when no tag
/// yields a date on or after `today`.
#[must_use]
pub fn next_resale_date(tags: &[String], today: NaiveDate) -> Option<(NaiveDate, Vec<String>)> {
    let mut resale_tags = Vec::new();
    let mut next: Option<NaiveDate> = None;

    for tag in tags {
        match parse_restock_tag(tag) {
            Ok(Some(date)) => {
                resale_tags.push(tag.trim().to_string());
                if date >= today && next.is_none_or(|current| date < current) {
                    next = Some(date);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed restock tag");
            }
        }
    }

    next.map(|date| (date, resale_tags))
}

/// Builds a [`RestockEntry`] for every product with a restock date of `today`
/// or later.
///
/// `detected_date` is set to `today`; the store keeps the original value when
/// the entry already exists.
#[must_use]
pub fn extract_restocks(
    catalog: &[Product],
    today: NaiveDate,
    now: DateTime<FixedOffset>,
) -> Vec<RestockEntry> {
    catalog
        .iter()
        .filter_map(|product| {
            let (next_resale_date, resale_tags) = next_resale_date(&product.tags, today)?;
            Some(RestockEntry {
                url: product.url.clone(),
                name: product.name.clone(),
                price: product.price,
                available: product.available,
                tags: product.tags.clone(),
                resale_tags,
                next_resale_date,
                detected_date: today,
                last_updated: now,
            })
        })
        .collect()
}
