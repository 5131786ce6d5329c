use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::CoreError;

/// Trait abstraction over the market-data gateway.
///
/// The real implementation talks to metalpriceapi.com; tests substitute an
/// in-memory mock. If the API changes, only the one implementation moves.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Current spot price of gold per troy ounce in `currency`, plus the
    /// upstream timestamp of the quote.
    async fn get_spot_price(
        &self,
        currency: &str,
    ) -> Result<(f64, DateTime<Utc>), CoreError>;

    /// Spot price of gold per troy ounce in `currency` on a past date.
    async fn get_historical_spot_price(
        &self,
        date: NaiveDate,
        currency: &str,
    ) -> Result<f64, CoreError>;

    /// Value of one unit of `from` expressed in `to`.
    async fn get_exchange_rate(&self, from: &str, to: &str) -> Result<f64, CoreError>;
}

/// Trait abstraction over the retail-price gateway (dealer web pages).
#[async_trait]
pub trait RetailPriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Current retail price of the product at `product_url`, in the
    /// currency implied by the source market.
    async fn get_retail_price(&self, product_url: &str) -> Result<f64, CoreError>;
}
