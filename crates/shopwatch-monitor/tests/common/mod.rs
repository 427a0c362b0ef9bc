//! In-memory fakes of the monitor's ports, shared by the cycle tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use shopwatch_core::{CanonicalTz, EventType, HistoryEvent, Product, RestockEntry};
use shopwatch_db::DbError;
use shopwatch_monitor::{CatalogSource, Clock, Monitor, MonitorSettings, MonitorStore};
use shopwatch_scraper::ScraperError;

pub const STORE: &str = "https://chiikawamarket.jp/zh-hant";
pub const PLACEHOLDER: &str = "https://cdn.example.com/no-image.png";

pub fn tz() -> CanonicalTz {
    CanonicalTz::from_offset_hours(8).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `h:00` local time on the given day, as UTC.
pub fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    tz().offset()
        .with_ymd_and_hms(y, m, d, h, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn url(handle: &str) -> String {
    format!("{STORE}/products/{handle}")
}

pub fn product(handle: &str) -> Product {
    Product {
        url: url(handle),
        name: handle.to_string(),
        price: 1100,
        available: true,
        tags: vec![],
        image_url: format!("https://cdn.example.com/{handle}.jpg"),
        last_seen: tz().normalize(&local(2025, 5, 1, 0)),
    }
}

pub fn tagged(handle: &str, tags: &[&str]) -> Product {
    Product {
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        ..product(handle)
    }
}

pub fn catalog(handles: &[&str]) -> Vec<Product> {
    handles.iter().map(|h| product(h)).collect()
}

pub fn settings() -> MonitorSettings {
    MonitorSettings {
        timezone: tz(),
        verify_passes: 3,
        verify_delay: Duration::ZERO,
        probe_delisted: true,
        probe_concurrency: 4,
        event_write_concurrency: 4,
        typed_retention_days: 7,
        ledger_retention_days: 30,
        placeholder_image_url: PLACEHOLDER.to_string(),
    }
}

pub type TestMonitor = Monitor<FakeSource, MemoryStore, FixedClock>;

pub struct Harness {
    pub source: FakeSource,
    pub store: MemoryStore,
    pub clock: FixedClock,
    pub monitor: TestMonitor,
}

pub fn harness(now: DateTime<Utc>) -> Harness {
    harness_with(now, settings())
}

pub fn harness_with(now: DateTime<Utc>, settings: MonitorSettings) -> Harness {
    let source = FakeSource::default();
    let store = MemoryStore::default();
    let clock = FixedClock::new(now);
    let monitor = Monitor::new(source.clone(), store.clone(), clock.clone(), settings);
    Harness {
        source,
        store,
        clock,
        monitor,
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FixedClock(Arc<Mutex<DateTime<Utc>>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Catalog source
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SourceState {
    /// Scripted responses, consumed one per fetch.
    scripted: VecDeque<Result<Vec<Product>, ScraperError>>,
    /// Returned once the script is exhausted.
    catalog: Vec<Product>,
    reachable: HashSet<String>,
    probed: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<SourceState>>,
    fetches: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn set_catalog(&self, products: Vec<Product>) {
        self.state.lock().unwrap().catalog = products;
    }

    pub fn push_fetch(&self, products: Vec<Product>) {
        self.state.lock().unwrap().scripted.push_back(Ok(products));
    }

    pub fn push_error(&self, err: ScraperError) {
        self.state.lock().unwrap().scripted.push_back(Err(err));
    }

    pub fn mark_reachable(&self, url: &str) {
        self.state.lock().unwrap().reachable.insert(url.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn probed(&self) -> Vec<String> {
        let mut probed = self.state.lock().unwrap().probed.clone();
        probed.sort();
        probed
    }
}

impl CatalogSource for FakeSource {
    async fn fetch_catalog(
        &self,
        observed_at: DateTime<FixedOffset>,
    ) -> Result<Vec<Product>, ScraperError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let products = match state.scripted.pop_front() {
            Some(result) => result?,
            None => state.catalog.clone(),
        };
        Ok(products
            .into_iter()
            .map(|p| Product {
                last_seen: observed_at,
                ..p
            })
            .collect())
    }

    async fn probe(&self, url: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        state.probed.push(url.to_string());
        state.reachable.contains(url)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    snapshot: BTreeMap<String, Product>,
    unified: Vec<HistoryEvent>,
    new_typed: Vec<HistoryEvent>,
    delisted_typed: Vec<HistoryEvent>,
    restocks: BTreeMap<String, RestockEntry>,
    failing_urls: HashSet<String>,
    snapshot_upserts: usize,
}

impl StoreState {
    fn typed(&mut self, event_type: EventType) -> &mut Vec<HistoryEvent> {
        match event_type {
            EventType::New => &mut self.new_typed,
            EventType::Delisted => &mut self.delisted_typed,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    offline: Arc<AtomicBool>,
    writes_offline: Arc<AtomicBool>,
    failing_loads: Arc<AtomicUsize>,
    loads: Arc<AtomicUsize>,
}

fn connectivity_error() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

fn record_error(url: &str) -> DbError {
    DbError::InvalidRow {
        table: "history_events",
        reason: format!("rejected {url}"),
    }
}

impl MemoryStore {
    pub fn seed_snapshot(&self, products: Vec<Product>) {
        let mut state = self.state.lock().unwrap();
        for p in products {
            state.snapshot.insert(p.url.clone(), p);
        }
    }

    /// Writes `event` to both ledgers, bypassing dedup.
    pub fn seed_event(&self, event: HistoryEvent) {
        let mut state = self.state.lock().unwrap();
        state.typed(event.event_type).push(event.clone());
        state.unified.push(event);
    }

    pub fn seed_unified_event(&self, event: HistoryEvent) {
        self.state.lock().unwrap().unified.push(event);
    }

    pub fn seed_restock(&self, entry: RestockEntry) {
        self.state
            .lock()
            .unwrap()
            .restocks
            .insert(entry.url.clone(), entry);
    }

    /// Every operation fails with a connectivity error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reads succeed; every write fails with a connectivity error.
    pub fn set_writes_offline(&self, offline: bool) {
        self.writes_offline.store(offline, Ordering::SeqCst);
    }

    /// The next `n` snapshot loads fail with a connectivity error.
    pub fn fail_next_loads(&self, n: usize) {
        self.failing_loads.store(n, Ordering::SeqCst);
    }

    /// Event writes for `url` fail with a non-connectivity error.
    pub fn fail_events_for(&self, url: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_urls
            .insert(url.to_string());
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Product> {
        self.state.lock().unwrap().snapshot.values().cloned().collect()
    }

    pub fn snapshot_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().snapshot.keys().cloned().collect()
    }

    pub fn snapshot_upserts(&self) -> usize {
        self.state.lock().unwrap().snapshot_upserts
    }

    pub fn unified(&self) -> Vec<HistoryEvent> {
        self.state.lock().unwrap().unified.clone()
    }

    pub fn typed(&self, event_type: EventType) -> Vec<HistoryEvent> {
        self.state.lock().unwrap().typed(event_type).clone()
    }

    pub fn restocks(&self) -> Vec<RestockEntry> {
        self.state.lock().unwrap().restocks.values().cloned().collect()
    }

    fn check_read(&self) -> Result<(), DbError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(connectivity_error());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), DbError> {
        self.check_read()?;
        if self.writes_offline.load(Ordering::SeqCst) {
            return Err(connectivity_error());
        }
        Ok(())
    }
}

impl MonitorStore for MemoryStore {
    async fn load_snapshot(&self) -> Result<Vec<Product>, DbError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        let failing = self.failing_loads.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_loads.store(failing - 1, Ordering::SeqCst);
            return Err(connectivity_error());
        }
        let mut products = self.snapshot();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn upsert_snapshot_product(&self, product: &Product) -> Result<(), DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        state.snapshot_upserts += 1;
        state.snapshot.insert(product.url.clone(), product.clone());
        Ok(())
    }

    async fn delete_snapshot_products(&self, urls: &[String]) -> Result<u64, DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let mut removed = 0;
        for url in urls {
            if state.snapshot.remove(url).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn record_event(&self, event: &HistoryEvent) -> Result<bool, DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        if state.failing_urls.contains(&event.url) {
            return Err(record_error(&event.url));
        }

        let in_unified = state.unified.iter().any(|e| {
            e.url == event.url && e.event_type == event.event_type && e.date == event.date
        });
        if !in_unified {
            state.unified.push(event.clone());
        }

        let typed = state.typed(event.event_type);
        let in_typed = typed
            .iter()
            .any(|e| e.url == event.url && e.date == event.date);
        if !in_typed {
            typed.push(event.clone());
        }

        Ok(!in_unified || !in_typed)
    }

    async fn has_delisted_record(&self, url: &str) -> Result<bool, DbError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state.delisted_typed.iter().any(|e| e.url == url))
    }

    async fn clear_delisted_records(&self, url: &str) -> Result<u64, DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let before = state.delisted_typed.len();
        state.delisted_typed.retain(|e| e.url != url);
        Ok((before - state.delisted_typed.len()) as u64)
    }

    async fn events_for_day(
        &self,
        event_type: EventType,
        date: NaiveDate,
    ) -> Result<Vec<HistoryEvent>, DbError> {
        self.check_read()?;
        let mut state = self.state.lock().unwrap();
        Ok(state
            .typed(event_type)
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect())
    }

    async fn events_in_range(
        &self,
        event_type: EventType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryEvent>, DbError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .unified
            .iter()
            .filter(|e| e.event_type == event_type && e.date >= start && e.date <= end)
            .cloned()
            .collect())
    }

    async fn prune_typed_events(
        &self,
        event_type: EventType,
        cutoff: NaiveDate,
    ) -> Result<u64, DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let typed = state.typed(event_type);
        let before = typed.len();
        typed.retain(|e| e.date >= cutoff);
        Ok((before - typed.len()) as u64)
    }

    async fn prune_unified_events(&self, cutoff: NaiveDate) -> Result<u64, DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let before = state.unified.len();
        state.unified.retain(|e| e.date >= cutoff);
        Ok((before - state.unified.len()) as u64)
    }

    async fn upsert_pending_restock(&self, entry: &RestockEntry) -> Result<(), DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let detected_date = state
            .restocks
            .get(&entry.url)
            .map_or(entry.detected_date, |existing| existing.detected_date);
        state.restocks.insert(
            entry.url.clone(),
            RestockEntry {
                detected_date,
                ..entry.clone()
            },
        );
        Ok(())
    }

    async fn remove_pending_restock(&self, url: &str) -> Result<bool, DbError> {
        self.check_write()?;
        Ok(self.state.lock().unwrap().restocks.remove(url).is_some())
    }

    async fn pending_restocks(
        &self,
        from: NaiveDate,
        until: Option<NaiveDate>,
    ) -> Result<Vec<RestockEntry>, DbError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        let mut entries: Vec<RestockEntry> = state
            .restocks
            .values()
            .filter(|e| e.next_resale_date >= from && until.is_none_or(|u| e.next_resale_date <= u))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.next_resale_date
                .cmp(&b.next_resale_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    async fn prune_pending_restocks(&self, today: NaiveDate) -> Result<u64, DbError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let before = state.restocks.len();
        state.restocks.retain(|_, e| e.next_resale_date >= today);
        Ok((before - state.restocks.len()) as u64)
    }
}
