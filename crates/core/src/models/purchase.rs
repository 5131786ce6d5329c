use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Grams per troy ounce.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1035;

/// A single physical coin/bar purchase.
///
/// Monetary fields (`price`, `historical_value`) are denominated in the
/// inventory's current currency and are rewritten in place when the display
/// currency changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Unique identifier, assigned from the inventory's monotone counter.
    pub id: u64,

    /// Free-text label ("2025 Britannia", "20g PAMP bar", ...)
    pub name: String,

    /// Cost paid, in the inventory's current currency
    pub price: f64,

    /// Weight in grams, normalized at entry regardless of input unit
    pub weight_grams: f64,

    /// Purchase date (daily granularity)
    pub date: NaiveDate,

    /// CGT-free bullion coin flag; absent in old documents, defaults false
    #[serde(default)]
    pub is_tax_free: bool,

    /// Spot price per troy ounce on `date`, in the current currency.
    /// Fetched lazily for the history graph and cached permanently.
    #[serde(default)]
    pub historical_value: Option<f64>,
}

impl PurchaseRecord {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        price: f64,
        weight_grams: f64,
        date: NaiveDate,
        is_tax_free: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            weight_grams,
            date,
            is_tax_free,
            historical_value: None,
        }
    }

    /// Weight expressed in troy ounces.
    #[must_use]
    pub fn weight_oz(&self) -> f64 {
        self.weight_grams / GRAMS_PER_TROY_OUNCE
    }
}

/// Standard CGT-free bullion coin sizes sold by the Royal Mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinSize {
    OneOunce,
    HalfOunce,
    QuarterOunce,
}

impl CoinSize {
    /// Fixed fine-gold weight of the coin in grams.
    #[must_use]
    pub fn weight_grams(self) -> f64 {
        match self {
            CoinSize::OneOunce => GRAMS_PER_TROY_OUNCE,
            CoinSize::HalfOunce => GRAMS_PER_TROY_OUNCE / 2.0,
            CoinSize::QuarterOunce => GRAMS_PER_TROY_OUNCE / 4.0,
        }
    }

    /// Royal Mint bullion product page for the current-year Britannia.
    #[must_use]
    pub fn product_url(self) -> &'static str {
        match self {
            CoinSize::OneOunce => {
                "https://www.royalmint.com/invest/bullion/bullion-coins/gold-coins/britannia-2025-1oz-gold-bullion-coin/"
            }
            CoinSize::HalfOunce => {
                "https://www.royalmint.com/invest/bullion/bullion-coins/gold-coins/britannia-2024-half-oz-gold-bullion-coin-in-blister/"
            }
            CoinSize::QuarterOunce => {
                "https://www.royalmint.com/invest/bullion/bullion-coins/gold-coins/britannia-2025-14oz-gold-bullion-coin-in-blister/"
            }
        }
    }

    /// Parse a user-entered size option ("1oz", "1/2oz", "1/4oz").
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        match input.trim().to_lowercase().as_str() {
            "1oz" => Ok(CoinSize::OneOunce),
            "1/2oz" => Ok(CoinSize::HalfOunce),
            "1/4oz" => Ok(CoinSize::QuarterOunce),
            other => Err(CoreError::ValidationError(format!(
                "Invalid coin size '{other}': expected 1oz, 1/2oz or 1/4oz"
            ))),
        }
    }
}

impl std::fmt::Display for CoinSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoinSize::OneOunce => write!(f, "1oz"),
            CoinSize::HalfOunce => write!(f, "1/2oz"),
            CoinSize::QuarterOunce => write!(f, "1/4oz"),
        }
    }
}

/// Parse a free-form weight entry into grams.
///
/// Accepts grams ("20g") or troy ounces ("1oz", "0.5oz"). The unit suffix is
/// required — a bare number is rejected rather than guessed at.
pub fn parse_weight(input: &str) -> Result<f64, CoreError> {
    let s = input.trim().to_lowercase();

    let (number, factor) = if let Some(prefix) = s.strip_suffix("oz") {
        (prefix, GRAMS_PER_TROY_OUNCE)
    } else if let Some(prefix) = s.strip_suffix('g') {
        (prefix, 1.0)
    } else {
        return Err(CoreError::ValidationError(format!(
            "Invalid weight '{input}': enter grams (e.g. 20g) or troy ounces (e.g. 1oz)"
        )));
    };

    let value: f64 = number.trim().parse().map_err(|_| {
        CoreError::ValidationError(format!("Invalid weight '{input}': not a number"))
    })?;

    if !value.is_finite() || value <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Invalid weight '{input}': must be positive"
        )));
    }

    Ok(value * factor)
}
