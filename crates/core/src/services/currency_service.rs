use log::{debug, error};

use crate::errors::CoreError;
use crate::models::config::Config;
use crate::models::inventory::{Inventory, MarketSnapshot};
use crate::providers::traits::MarketDataProvider;

/// Result of a rebase request.
#[derive(Debug, Clone, PartialEq)]
pub enum RebaseOutcome {
    /// New currency equals the old one — nothing to do
    Unchanged,
    /// Every monetary field converted; commit `inventory` and `currency`
    Rebased {
        inventory: Inventory,
        currency: String,
        rate: f64,
    },
}

/// Converts every monetary field in the inventory to a new display
/// currency.
///
/// Invariant: all monetary fields are expressed in a single currency at all
/// times. The service therefore never mutates its input — it builds a fully
/// converted copy and hands it back only once every fetch has succeeded, so
/// the caller either commits the whole thing or keeps the prior state.
pub struct CurrencyService;

impl CurrencyService {
    pub fn new() -> Self {
        Self
    }

    pub async fn rebase(
        &self,
        provider: &dyn MarketDataProvider,
        inventory: &Inventory,
        old_currency: &str,
        new_currency: &str,
    ) -> Result<RebaseOutcome, CoreError> {
        let old = Config::normalize_currency(old_currency)?;
        let new = Config::normalize_currency(new_currency)?;

        if old == new {
            return Ok(RebaseOutcome::Unchanged);
        }

        // One unit of the old currency, expressed in the new one.
        let rate = provider.get_exchange_rate(&old, &new).await.map_err(|e| {
            error!("Rebase {old}->{new} aborted: rate fetch failed: {e}");
            e
        })?;

        // The spot price is re-fetched in the new currency rather than
        // derived from the FX rate: metal quotes and generic FX rates come
        // from different fixings and compounding them drifts.
        let (price_per_oz, fetched_at) =
            provider.get_spot_price(&new).await.map_err(|e| {
                error!("Rebase {old}->{new} aborted: spot fetch failed: {e}");
                e
            })?;

        let mut converted = inventory.clone();
        for record in &mut converted.records {
            record.price *= rate;
            if let Some(historical) = record.historical_value.as_mut() {
                *historical *= rate;
            }
        }
        converted.snapshot = Some(MarketSnapshot {
            price_per_oz,
            fetched_at,
            currency: new.clone(),
        });

        debug!("Rebased {} records {old}->{new} at rate {rate}", converted.records.len());
        Ok(RebaseOutcome::Rebased {
            inventory: converted,
            currency: new,
            rate,
        })
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new()
    }
}
