use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::errors::CoreError;
use crate::models::inventory::{Inventory, MarketSnapshot};
use crate::providers::traits::MarketDataProvider;

/// How long a spot-price snapshot stays valid.
const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Whether the snapshot was reused or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Existing snapshot was still inside the freshness window
    Cached,
    /// A new snapshot was fetched and written onto the inventory
    Refreshed,
}

/// Governs the shared spot-price snapshot: decides when it must be
/// refreshed and performs the refresh.
///
/// Persistence stays with the caller — on `Refreshed` the inventory has
/// changed and should be saved.
pub struct PriceService;

impl PriceService {
    pub fn new() -> Self {
        Self
    }

    /// Valid iff a snapshot exists, is denominated in `currency`, and is
    /// younger than 24 hours.
    #[must_use]
    pub fn is_fresh(&self, inventory: &Inventory, currency: &str, now: DateTime<Utc>) -> bool {
        match &inventory.snapshot {
            Some(snapshot) => {
                snapshot.currency.eq_ignore_ascii_case(currency)
                    && now < snapshot.fetched_at + Duration::hours(FRESHNESS_WINDOW_HOURS)
            }
            None => false,
        }
    }

    /// Reuse the snapshot if fresh, otherwise fetch a new one.
    ///
    /// On fetch failure the error propagates and the inventory is left
    /// untouched — there is no stale-data fallback past the window.
    pub async fn ensure_fresh(
        &self,
        provider: &dyn MarketDataProvider,
        inventory: &mut Inventory,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, CoreError> {
        if self.is_fresh(inventory, currency, now) {
            debug!("Spot price snapshot still fresh, no refresh");
            return Ok(RefreshOutcome::Cached);
        }

        let (price_per_oz, fetched_at) = provider.get_spot_price(currency).await?;
        debug!("Refreshed spot price: {price_per_oz:.2} {currency}/ozt at {fetched_at}");

        inventory.snapshot = Some(MarketSnapshot {
            price_per_oz,
            fetched_at,
            currency: currency.to_uppercase(),
        });
        Ok(RefreshOutcome::Refreshed)
    }
}

impl Default for PriceService {
    fn default() -> Self {
        Self::new()
    }
}
