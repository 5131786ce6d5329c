use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::RetailPriceProvider;

const PROVIDER: &str = "royalmint.com";

/// Retail-price gateway scraping Royal Mint bullion product pages.
///
/// The product page embeds its pricing table as JSON in the
/// `data-product-settings` attribute of the `div[data-module="product"]`
/// element; the single-unit price is the entry with `Quantity == 1`.
pub struct RoyalMintScraper {
    client: Client,
}

impl RoyalMintScraper {
    pub fn new() -> Self {
        let builder = Client::builder().timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for RoyalMintScraper {
    fn default() -> Self {
        Self::new()
    }
}

// ── Embedded product JSON ───────────────────────────────────────────

#[derive(Deserialize)]
struct ProductSettings {
    pricing: Vec<PricingTier>,
}

#[derive(Deserialize)]
struct PricingTier {
    #[serde(rename = "Quantity")]
    quantity: u32,
    #[serde(rename = "PriceString")]
    price_string: String,
}

/// Extract the single-unit price from a product page's HTML.
///
/// Split out from the HTTP call so page-structure changes can be caught by
/// fixture tests without a network.
pub fn parse_product_price(html: &str, url: &str) -> Result<f64, CoreError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"div[data-module="product"]"#)
        .map_err(|e| CoreError::ProductNotFound(format!("{url} (bad selector: {e})")))?;

    let settings_json = document
        .select(&selector)
        .next()
        .and_then(|div| div.value().attr("data-product-settings"))
        .ok_or_else(|| CoreError::ProductNotFound(url.to_string()))?;

    let settings: ProductSettings = serde_json::from_str(settings_json)
        .map_err(|_| CoreError::ProductNotFound(url.to_string()))?;

    let tier = settings
        .pricing
        .iter()
        .find(|t| t.quantity == 1)
        .ok_or_else(|| CoreError::ProductNotFound(url.to_string()))?;

    tier.price_string
        .replace('£', "")
        .replace(',', "")
        .trim()
        .parse()
        .map_err(|_| CoreError::ProductNotFound(url.to_string()))
}

#[async_trait]
impl RetailPriceProvider for RoyalMintScraper {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_retail_price(&self, product_url: &str) -> Result<f64, CoreError> {
        let html = self
            .client
            .get(product_url)
            .send()
            .await?
            .text()
            .await?;

        parse_product_price(&html, product_url)
    }
}
