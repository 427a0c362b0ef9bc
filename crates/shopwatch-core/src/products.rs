use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One catalog item as last observed on the storefront.
///
/// `url` is the join key across the snapshot, the ledgers, and the
/// pending-restock table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Canonical storefront URL, e.g. `"https://chiikawamarket.jp/zh-hant/products/4571609345678"`.
    pub url: String,
    pub name: String,
    /// First-variant price truncated to a whole number (`"1100.00"` → `1100`).
    pub price: i64,
    /// First-variant stock flag.
    pub available: bool,
    /// Raw storefront tags. Order carries no meaning.
    pub tags: Vec<String>,
    /// First product image, or the configured placeholder when the product has none.
    pub image_url: String,
    /// Observation time of the last snapshot write for this product. Unchanged
    /// products are not rewritten, so this can trail the latest fetch.
    pub last_seen: DateTime<FixedOffset>,
}

impl Product {
    #[must_use]
    pub fn listing(&self) -> Listing {
        Listing {
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }
}

/// Kind of transition recorded in the history ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    New,
    Delisted,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::New => "new",
            EventType::Delisted => "delisted",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(EventType::New),
            "delisted" => Ok(EventType::Delisted),
            other => Err(format!(
                "unknown event type \"{other}\" (expected \"new\" or \"delisted\")"
            )),
        }
    }
}

/// An immutable "product X became {new|delisted} at time T" fact.
///
/// At most one event per `(url, event_type, date)` exists in any ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Calendar day of `time` in the canonical timezone.
    pub date: NaiveDate,
    pub time: DateTime<FixedOffset>,
    pub event_type: EventType,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub price: Option<i64>,
    pub available: Option<bool>,
    pub tags: Vec<String>,
    /// `true` when this `new` event follows a still-retained delisting of the same URL.
    pub is_restock: bool,
}

impl HistoryEvent {
    /// Builds an event for `product` observed at `time`.
    ///
    /// `is_restock` starts out `false`; the ledger decides it at write time.
    #[must_use]
    pub fn from_product(product: &Product, event_type: EventType, time: DateTime<FixedOffset>) -> Self {
        Self {
            date: time.date_naive(),
            time,
            event_type,
            name: product.name.clone(),
            url: product.url.clone(),
            image_url: product.image_url.clone(),
            price: Some(product.price),
            available: Some(product.available),
            tags: product.tags.clone(),
            is_restock: false,
        }
    }
}

/// A product carrying a date-coded restock tag for today or later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockEntry {
    pub url: String,
    pub name: String,
    pub price: i64,
    pub available: bool,
    pub tags: Vec<String>,
    /// Tags that parsed as restock dates (past ones included).
    pub resale_tags: Vec<String>,
    /// Earliest tag-derived date that is still today or later.
    pub next_resale_date: NaiveDate,
    /// First day this entry was seen. Preserved across upserts.
    pub detected_date: NaiveDate,
    pub last_updated: DateTime<FixedOffset>,
}

/// `(name, url)` pair handed to notifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub url: String,
}
