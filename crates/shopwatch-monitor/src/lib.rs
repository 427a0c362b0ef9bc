//! Reconciliation orchestrator for a single storefront catalog.
//!
//! [`Monitor`] drives one check cycle at a time: read the snapshot, fetch the
//! catalog several times and insist the passes agree, classify the diff,
//! record history events, reconcile the snapshot and pending restocks, and
//! prune old records. Storage, the upstream catalog, and the clock are
//! injected through the traits in [`ports`] and [`clock`].

pub mod clock;
pub mod error;
pub mod monitor;
pub mod ports;
pub mod retry;
pub mod source;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::{CycleError, FailureKind};
pub use monitor::{Monitor, MonitorSettings};
pub use ports::{CatalogSource, MonitorStore};
pub use retry::run_cycle_with_retry;
pub use store::PgStore;
