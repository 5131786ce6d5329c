use log::warn;

use crate::models::inventory::Inventory;
use crate::models::purchase::GRAMS_PER_TROY_OUNCE;
use crate::models::timeline::{TimelineOutcome, TimelinePoint};
use crate::providers::traits::MarketDataProvider;

/// Result of a timeline reconstruction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineBuild {
    pub outcome: TimelineOutcome,

    /// Whether any record gained a newly fetched historical value — the
    /// caller should persist the inventory exactly once if so.
    pub records_updated: bool,
}

/// Rebuilds the chronological series of portfolio value versus cost basis.
///
/// Historical spot prices are fetched lazily, strictly in date order, one
/// blocking call per record that lacks a cached value, and cached onto the
/// record permanently. A single failed fetch drops that record from the
/// series and the walk continues — one missing price must not take down the
/// whole graph.
pub struct TimelineService;

impl TimelineService {
    pub fn new() -> Self {
        Self
    }

    pub async fn reconstruct(
        &self,
        provider: &dyn MarketDataProvider,
        inventory: &mut Inventory,
        currency: &str,
    ) -> TimelineBuild {
        if inventory.is_empty() {
            return TimelineBuild {
                outcome: TimelineOutcome::Unavailable,
                records_updated: false,
            };
        }

        // Stable sort: ties keep insertion order.
        let mut order: Vec<usize> = (0..inventory.records.len()).collect();
        order.sort_by_key(|&i| inventory.records[i].date);

        let mut points = Vec::with_capacity(order.len());
        let mut running_cost = 0.0;
        let mut running_weight_grams = 0.0;
        let mut records_updated = false;

        for idx in order {
            let record = &mut inventory.records[idx];

            if record.historical_value.is_none() {
                match provider
                    .get_historical_spot_price(record.date, currency)
                    .await
                {
                    Ok(price) => {
                        record.historical_value = Some(price);
                        records_updated = true;
                    }
                    Err(e) => {
                        warn!(
                            "No historical price for '{}' on {}: {e}; skipping point",
                            record.name, record.date
                        );
                        continue;
                    }
                }
            }

            // Filled by the branch above, or the record was skipped
            let historical = record.historical_value.unwrap_or_default();

            running_cost += record.price;
            running_weight_grams += record.weight_grams;

            let total_value = (running_weight_grams / GRAMS_PER_TROY_OUNCE) * historical;
            points.push(TimelinePoint {
                date: record.date,
                total_value,
                total_cost: running_cost,
                profit_loss: total_value - running_cost,
            });
        }

        let outcome = if points.is_empty() {
            TimelineOutcome::Unavailable
        } else {
            TimelineOutcome::Series(points)
        };

        TimelineBuild {
            outcome,
            records_updated,
        }
    }
}

impl Default for TimelineService {
    fn default() -> Self {
        Self::new()
    }
}
