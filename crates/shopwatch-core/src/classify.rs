//! Change classification under multi-pass verification.
//!
//! A storefront occasionally serves a short page or drops a product for a
//! single request. Trusting one fetch would report a delisting followed by a
//! "new" listing a few minutes later. The classifier therefore only accepts
//! a catalog when every verification pass produced the same URL set, and only
//! then diffs it against the persisted baseline.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::products::Product;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("no verification passes were supplied")]
    NoFetches,

    #[error("verification pass {pass} returned an empty catalog")]
    EmptyFetch { pass: usize },

    #[error(
        "verification pass {pass} disagrees with pass 1: {missing} url(s) missing, {extra} extra"
    )]
    Inconsistent {
        pass: usize,
        missing: usize,
        extra: usize,
    },
}

/// Result of diffing a verified catalog against the baseline.
///
/// Both URL lists are sorted, so the output depends only on set contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub is_first_run: bool,
    pub new_urls: Vec<String>,
    pub delisted_urls: Vec<String>,
}

/// Collects the URL set of one fetch.
#[must_use]
pub fn url_set(products: &[Product]) -> BTreeSet<String> {
    products.iter().map(|p| p.url.clone()).collect()
}

/// Checks that every pass returned the same non-empty URL set.
///
/// Passes are numbered from 1 in errors. Returns the agreed set.
///
/// # Errors
///
/// - [`ClassifyError::NoFetches`] when `fetches` is empty.
/// - [`ClassifyError::EmptyFetch`] when any pass is empty.
/// - [`ClassifyError::Inconsistent`] for the first pass that differs from pass 1.
pub fn verify_consistent(fetches: &[BTreeSet<String>]) -> Result<&BTreeSet<String>, ClassifyError> {
    let (first, rest) = fetches.split_first().ok_or(ClassifyError::NoFetches)?;

    for (idx, fetch) in fetches.iter().enumerate() {
        if fetch.is_empty() {
            return Err(ClassifyError::EmptyFetch { pass: idx + 1 });
        }
    }

    for (idx, fetch) in rest.iter().enumerate() {
        if fetch != first {
            return Err(ClassifyError::Inconsistent {
                pass: idx + 2,
                missing: first.difference(fetch).count(),
                extra: fetch.difference(first).count(),
            });
        }
    }

    Ok(first)
}

/// Diffs the verified live catalog against `baseline`.
///
/// An empty baseline is a seed run: nothing is new and nothing is delisted.
///
/// # Errors
///
/// Propagates any [`ClassifyError`] from [`verify_consistent`].
pub fn classify(
    baseline: &BTreeSet<String>,
    live_fetches: &[BTreeSet<String>],
) -> Result<Classification, ClassifyError> {
    let live = verify_consistent(live_fetches)?;

    if baseline.is_empty() {
        return Ok(Classification {
            is_first_run: true,
            ..Classification::default()
        });
    }

    Ok(Classification {
        is_first_run: false,
        new_urls: live.difference(baseline).cloned().collect(),
        delisted_urls: baseline.difference(live).cloned().collect(),
    })
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
