use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::MarketDataProvider;

const BASE_URL: &str = "https://api.metalpriceapi.com/v1";
const PROVIDER: &str = "metalpriceapi.com";

/// metalpriceapi.com gateway for gold spot prices and FX rates.
///
/// - **Requires**: 32-character API key.
/// - **Quote convention**: with `base=GBP&currencies=XAU` the response carries
///   `rates["GBPXAU"]` = price of one troy ounce of gold in GBP.
/// - Historical quotes use the dated endpoint (`/{YYYY-MM-DD}`).
pub struct MetalPriceApiProvider {
    client: Client,
    api_key: String,
}

impl MetalPriceApiProvider {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder().timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }

    async fn fetch_rates(&self, path: &str, base: &str, symbols: &str) -> Result<RatesResponse, CoreError> {
        let url = format!("{BASE_URL}/{path}");
        let resp: RatesResponse = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("base", base),
                ("currencies", symbols),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse response for base {base}: {e}"),
            })?;
        Ok(resp)
    }

    fn rate_from(resp: &RatesResponse, key: &str) -> Result<f64, CoreError> {
        resp.rates
            .as_ref()
            .and_then(|rates| rates.get(key))
            .copied()
            .ok_or_else(|| CoreError::InvalidResponse {
                provider: PROVIDER.into(),
                detail: format!("'rates' missing or has no '{key}' entry — is the API key valid?"),
            })
    }
}

/// Quotes round down to two decimal places, the convention the rest of the
/// system was calibrated against.
fn floor_to_cents(raw: f64) -> f64 {
    (raw * 100.0).floor() / 100.0
}

// ── metalpriceapi.com response types ────────────────────────────────

#[derive(Deserialize)]
struct RatesResponse {
    rates: Option<HashMap<String, f64>>,
    timestamp: Option<i64>,
}

#[async_trait]
impl MarketDataProvider for MetalPriceApiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_spot_price(
        &self,
        currency: &str,
    ) -> Result<(f64, DateTime<Utc>), CoreError> {
        let base = currency.to_uppercase();
        let resp = self.fetch_rates("latest", &base, "XAU").await?;

        let raw = Self::rate_from(&resp, &format!("{base}XAU"))?;
        let price = floor_to_cents(raw);

        let fetched_at = resp
            .timestamp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        Ok((price, fetched_at))
    }

    async fn get_historical_spot_price(
        &self,
        date: NaiveDate,
        currency: &str,
    ) -> Result<f64, CoreError> {
        let base = currency.to_uppercase();
        let path = date.format("%Y-%m-%d").to_string();
        let resp = self.fetch_rates(&path, &base, "XAU").await?;
        Self::rate_from(&resp, &format!("{base}XAU"))
    }

    async fn get_exchange_rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        let base = from.to_uppercase();
        let target = to.to_uppercase();

        if base == target {
            return Ok(1.0);
        }

        let resp = self.fetch_rates("latest", &base, &target).await?;
        Self::rate_from(&resp, &format!("{base}{target}"))
    }
}
