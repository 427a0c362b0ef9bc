//! Event persistence: new listings, delisting confirmation, delisted events.

use chrono::{DateTime, FixedOffset};
use futures::stream::{self, StreamExt};
use shopwatch_core::{EventType, HistoryEvent, Listing, Product};
use shopwatch_db::DbError;

use super::{tolerate, Monitor};
use crate::clock::Clock;
use crate::error::CycleError;
use crate::ports::{CatalogSource, MonitorStore};

pub(super) struct NewListingOutcome {
    pub listings: Vec<Listing>,
    /// Subset of `listings` that reappeared after a retained delisting.
    pub restocks: Vec<Listing>,
}

fn sort_listings(listings: &mut [Listing]) {
    listings.sort_by(|a, b| a.url.cmp(&b.url));
}

impl<C, S, K> Monitor<C, S, K>
where
    C: CatalogSource,
    S: MonitorStore,
    K: Clock,
{
    /// Records a `new` event for each product, in bounded concurrent batches.
    pub(super) async fn record_new_listings(
        &self,
        products: &[&Product],
        at: DateTime<FixedOffset>,
    ) -> Result<NewListingOutcome, CycleError> {
        let results: Vec<(&Product, Result<bool, DbError>)> = stream::iter(products.iter().copied())
            .map(|product| async move { (product, self.record_new(product, at).await) })
            .buffer_unordered(self.settings.event_write_concurrency.max(1))
            .boxed()
            .collect()
            .await;

        let mut listings = Vec::with_capacity(results.len());
        let mut restocks = Vec::new();
        for (product, result) in results {
            let is_restock = tolerate("record new listing", &product.url, result)?.unwrap_or(false);
            listings.push(product.listing());
            if is_restock {
                restocks.push(product.listing());
            }
        }
        sort_listings(&mut listings);
        sort_listings(&mut restocks);

        Ok(NewListingOutcome { listings, restocks })
    }

    /// Writes one `new` event. Returns whether it was a reappearance.
    ///
    /// A product is a reappearance when the typed delisted ledger still holds
    /// it. Its delisted records and pending restock are then removed.
    async fn record_new(&self, product: &Product, at: DateTime<FixedOffset>) -> Result<bool, DbError> {
        let mut event = HistoryEvent::from_product(product, EventType::New, at);
        event.is_restock = self.store.has_delisted_record(&product.url).await?;

        let inserted = self.store.record_event(&event).await?;
        if event.is_restock {
            self.store.clear_delisted_records(&product.url).await?;
            self.store.remove_pending_restock(&product.url).await?;
        }

        tracing::debug!(
            url = %product.url,
            inserted,
            is_restock = event.is_restock,
            "recorded new listing"
        );
        Ok(event.is_restock)
    }

    /// Splits delisted candidates into `(confirmed, still_reachable)`.
    ///
    /// With probing disabled every candidate is confirmed.
    pub(super) async fn confirm_delisted<'a>(
        &self,
        candidates: Vec<&'a Product>,
    ) -> (Vec<&'a Product>, Vec<&'a Product>) {
        if !self.settings.probe_delisted || candidates.is_empty() {
            return (candidates, Vec::new());
        }

        let probed: Vec<(&Product, bool)> = stream::iter(candidates)
            .map(|product| async move { (product, self.source.probe(&product.url).await) })
            .buffer_unordered(self.settings.probe_concurrency.max(1))
            .boxed()
            .collect()
            .await;

        let (mut reachable, mut confirmed): (Vec<_>, Vec<_>) =
            probed.into_iter().partition(|(_, reachable)| *reachable);
        confirmed.sort_by(|a, b| a.0.url.cmp(&b.0.url));
        reachable.sort_by(|a, b| a.0.url.cmp(&b.0.url));

        for (product, _) in &reachable {
            tracing::info!(url = %product.url, "missing from catalog but still reachable; not delisting");
        }

        (
            confirmed.into_iter().map(|(p, _)| p).collect(),
            reachable.into_iter().map(|(p, _)| p).collect(),
        )
    }

    /// Records a `delisted` event for each confirmed product.
    ///
    /// Events are built from the snapshot record, so the last known image is
    /// kept; an empty image falls back to the placeholder.
    pub(super) async fn record_delisted(
        &self,
        products: &[&Product],
        at: DateTime<FixedOffset>,
    ) -> Result<Vec<Listing>, CycleError> {
        let results: Vec<(&Product, Result<bool, DbError>)> = stream::iter(products.iter().copied())
            .map(|product| async move {
                let mut event = HistoryEvent::from_product(product, EventType::Delisted, at);
                if event.image_url.is_empty() {
                    event.image_url.clone_from(&self.settings.placeholder_image_url);
                }
                (product, self.store.record_event(&event).await)
            })
            .buffer_unordered(self.settings.event_write_concurrency.max(1))
            .boxed()
            .collect()
            .await;

        let mut listings = Vec::with_capacity(results.len());
        for (product, result) in results {
            if let Some(inserted) = tolerate("record delisting", &product.url, result)? {
                tracing::debug!(url = %product.url, inserted, "recorded delisting");
            }
            listings.push(product.listing());
        }
        sort_listings(&mut listings);

        Ok(listings)
    }
}
