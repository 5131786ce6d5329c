use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;

use crate::models::inventory::{Inventory, MarketSnapshot};
use crate::models::purchase::PurchaseRecord;

/// Current on-disk schema version of the inventory document.
pub const CURRENT_VERSION: u16 = 1;

/// The legacy document is a bare array of records with the spot price
/// duplicated onto every entry and dates in mixed formats. This is the raw
/// shape; `migrate_legacy` lifts it into the current aggregate.
#[derive(Deserialize)]
pub struct LegacyRecord {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub weight: f64,
    pub date: String,
    #[serde(default)]
    pub is_cgt_free: bool,
    #[serde(default)]
    pub gold_price: Option<f64>,
    #[serde(default)]
    pub gold_price_timestamp: Option<String>,
    #[serde(default)]
    pub historical_value: Option<f64>,
}

/// Decode an inventory document of any known version.
///
/// Returns `None` if the value matches no schema at all; the caller treats
/// that the same as a missing file (empty inventory).
pub fn decode_document(value: serde_json::Value, currency: &str) -> Option<Inventory> {
    // Current versioned shape first
    if let Some(version) = value.get("version").and_then(|v| v.as_u64()) {
        if version as u16 == CURRENT_VERSION {
            return serde_json::from_value::<VersionedDocument>(value)
                .ok()
                .map(|doc| doc.inventory);
        }
        warn!("Unknown inventory schema version {version}, treating as empty");
        return None;
    }

    // Legacy bare-array shape
    if value.is_array() {
        let legacy: Vec<LegacyRecord> = serde_json::from_value(value).ok()?;
        return Some(migrate_legacy(legacy, currency));
    }

    None
}

#[derive(Deserialize)]
struct VersionedDocument {
    #[allow(dead_code)]
    version: u16,
    #[serde(flatten)]
    inventory: Inventory,
}

/// One-shot migration of the legacy record array into the current aggregate.
///
/// - missing `is_cgt_free` defaults to false (serde default)
/// - dates are reparsed (ISO date, ISO datetime, or `%d-%m-%Y`); a record
///   whose date parses as none of these is skipped
/// - the per-record spot price collapses into one aggregate snapshot,
///   taken from the first record carrying one
/// - `next_id` resumes above the highest surviving id
pub fn migrate_legacy(legacy: Vec<LegacyRecord>, currency: &str) -> Inventory {
    let mut snapshot: Option<MarketSnapshot> = None;
    let mut records = Vec::with_capacity(legacy.len());
    let mut max_id = 0u64;

    for item in legacy {
        let date = match parse_legacy_date(&item.date) {
            Some(d) => d,
            None => {
                warn!(
                    "Skipping record {} ('{}'): unparseable date '{}'",
                    item.id, item.name, item.date
                );
                continue;
            }
        };

        if snapshot.is_none() {
            if let (Some(price), Some(ts)) = (item.gold_price, item.gold_price_timestamp.as_deref())
            {
                if let Some(fetched_at) = parse_legacy_timestamp(ts) {
                    snapshot = Some(MarketSnapshot {
                        price_per_oz: price,
                        fetched_at,
                        currency: currency.to_string(),
                    });
                }
            }
        }

        max_id = max_id.max(item.id);
        records.push(PurchaseRecord {
            id: item.id,
            name: item.name,
            price: item.price,
            weight_grams: item.weight,
            date,
            is_tax_free: item.is_cgt_free,
            historical_value: item.historical_value,
        });
    }

    debug!(
        "Migrated legacy inventory: {} records, snapshot {}",
        records.len(),
        if snapshot.is_some() { "present" } else { "absent" }
    );

    Inventory {
        records,
        snapshot,
        next_id: max_id + 1,
    }
}

/// Accepts ISO dates, ISO datetimes (from a previous normalization pass),
/// and the oldest day-month-year entry format.
fn parse_legacy_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%d-%m-%Y").ok()
}

/// Legacy timestamps were naive local ISO strings; read them as UTC.
fn parse_legacy_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
