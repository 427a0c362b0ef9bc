//! Read-only query commands. Output is pretty-printed JSON on stdout.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use shopwatch_core::EventType;

use crate::LiveMonitor;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the snapshot cannot be read.
pub(crate) async fn print_catalog(monitor: &LiveMonitor) -> anyhow::Result<()> {
    let products = monitor.get_current_catalog().await?;
    print_json(&products)
}

/// Prints one day of events from the typed ledger, or an inclusive range
/// from the unified ledger. With neither given, prints today's events.
///
/// # Errors
///
/// Returns an error if the range is inverted or the ledger cannot be read.
pub(crate) async fn print_events(
    monitor: &LiveMonitor,
    event_type: EventType,
    date: Option<NaiveDate>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> anyhow::Result<()> {
    let events = match range {
        Some((from, to)) => {
            anyhow::ensure!(from <= to, "--from {from} is after --to {to}");
            monitor.get_events_in_range(event_type, from, to).await?
        }
        None => {
            let day = date.unwrap_or_else(|| monitor.settings().timezone.date_of(&Utc::now()));
            monitor.get_events_for_day(event_type, day).await?
        }
    };
    print_json(&events)
}

/// # Errors
///
/// Returns an error if the pending-restock table cannot be read.
pub(crate) async fn print_restocks(
    monitor: &LiveMonitor,
    within_days: Option<u32>,
) -> anyhow::Result<()> {
    let entries = monitor.get_pending_restocks(within_days).await?;
    print_json(&entries)
}
