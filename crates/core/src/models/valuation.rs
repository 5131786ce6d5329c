use serde::{Deserialize, Serialize};

/// Aggregate portfolio metrics at the current spot price.
///
/// Produced by `ValuationService`; all monetary fields are in the
/// inventory's current currency.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValuationSummary {
    /// Total held weight in grams
    pub total_weight_grams: f64,

    /// Total held weight in troy ounces
    pub total_weight_oz: f64,

    /// Holdings marked to the current spot price
    pub total_value: f64,

    /// Cost basis: sum of purchase prices
    pub total_cost: f64,

    /// `total_value - total_cost`
    pub profit_loss: f64,

    /// Value of CGT-free coins at the current spot price
    pub tax_free_value: f64,

    /// `total_value - tax_free_value`
    pub non_tax_free_value: f64,
}
