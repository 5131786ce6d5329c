use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::inventory::Inventory;
use crate::models::purchase::{parse_weight, CoinSize, PurchaseRecord};

/// How the weight of a new purchase is specified.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightSpec {
    /// A standard coin size preset (implies a CGT-free Britannia)
    Coin(CoinSize),
    /// Free-form entry like "20g" or "1oz"
    FreeForm(String),
}

/// Mutating operations on the inventory aggregate.
pub struct InventoryService;

impl InventoryService {
    pub fn new() -> Self {
        Self
    }

    /// Add a purchase. The id comes from the inventory's monotone counter,
    /// so ids are never reused even after removals in the same session.
    pub fn add_purchase(
        &self,
        inventory: &mut Inventory,
        name: impl Into<String>,
        weight: WeightSpec,
        price: f64,
        date: NaiveDate,
        is_tax_free: bool,
    ) -> Result<u64, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Purchase name must not be empty".to_string(),
            ));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Invalid price {price}: must be finite and non-negative"
            )));
        }

        let weight_grams = match weight {
            WeightSpec::Coin(size) => size.weight_grams(),
            WeightSpec::FreeForm(input) => parse_weight(&input)?,
        };

        let id = inventory.take_next_id();
        inventory
            .records
            .push(PurchaseRecord::new(id, name, price, weight_grams, date, is_tax_free));
        Ok(id)
    }

    /// Remove a purchase by id. Absent ids are a silent no-op; returns
    /// whether anything was removed so callers can word their message.
    pub fn remove_purchase(&self, inventory: &mut Inventory, id: u64) -> bool {
        inventory.remove(id)
    }
}

impl Default for InventoryService {
    fn default() -> Self {
        Self::new()
    }
}
