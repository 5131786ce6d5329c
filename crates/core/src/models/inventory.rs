use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::purchase::PurchaseRecord;

/// The shared spot-price snapshot for the whole inventory.
///
/// There is exactly one of these per inventory (or none before the first
/// fetch): every record is valued against the same spot price, so the price
/// lives on the aggregate rather than being duplicated onto each record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Spot price of gold per troy ounce
    pub price_per_oz: f64,

    /// When the price was fetched
    pub fetched_at: DateTime<Utc>,

    /// Currency the price is denominated in (ISO-4217 style, e.g. "GBP")
    pub currency: String,
}

/// The main data container: all purchases, the shared market snapshot, and
/// the id counter. Serialized whole as one pretty-printed JSON document.
///
/// Invariant: `next_id` is strictly greater than every record id, and only
/// ever increases — removing a record never frees its id for reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// All purchases, insertion order preserved
    pub records: Vec<PurchaseRecord>,

    /// Latest spot-price fetch, if any
    pub snapshot: Option<MarketSnapshot>,

    /// Next purchase id to assign
    pub next_id: u64,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            snapshot: None,
            next_id: 1,
        }
    }
}

impl Inventory {
    /// Take the next purchase id, advancing the counter.
    pub fn take_next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Remove the record with the given id. A no-op if the id is absent —
    /// returns whether anything was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    /// Find a record by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&PurchaseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
