use crate::models::purchase::{PurchaseRecord, GRAMS_PER_TROY_OUNCE};
use crate::models::valuation::ValuationSummary;

/// Computes aggregate metrics from the current records and spot price.
///
/// Pure: no I/O, no cache. Every record is valued at the single shared spot
/// price, never at its own historical value.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(
        &self,
        records: &[PurchaseRecord],
        spot_per_oz: f64,
    ) -> ValuationSummary {
        let total_weight_grams: f64 = records.iter().map(|r| r.weight_grams).sum();
        let total_value: f64 = records.iter().map(|r| r.weight_oz() * spot_per_oz).sum();
        let total_cost: f64 = records.iter().map(|r| r.price).sum();

        let tax_free_value: f64 = records
            .iter()
            .filter(|r| r.is_tax_free)
            .map(|r| r.weight_oz() * spot_per_oz)
            .sum();

        ValuationSummary {
            total_weight_grams,
            total_weight_oz: total_weight_grams / GRAMS_PER_TROY_OUNCE,
            total_value,
            total_cost,
            profit_loss: total_value - total_cost,
            tax_free_value,
            non_tax_free_value: total_value - tax_free_value,
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
