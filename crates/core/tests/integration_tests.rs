use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::tempdir;

use gold_tracker_core::commands::{self, Command};
use gold_tracker_core::errors::CoreError;
use gold_tracker_core::models::purchase::{CoinSize, GRAMS_PER_TROY_OUNCE};
use gold_tracker_core::providers::royal_mint::parse_product_price;
use gold_tracker_core::providers::traits::{MarketDataProvider, RetailPriceProvider};
use gold_tracker_core::services::inventory_service::WeightSpec;
use gold_tracker_core::GoldTracker;

fn make_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Scripted market-data gateway with shared call counters, so a reopened
/// tracker can be given a fresh instance that still reports into the same
/// tallies.
struct ScriptedMarket {
    spot: f64,
    historical: f64,
    rate: f64,
    fail_spot: bool,
    historical_calls: Arc<AtomicUsize>,
}

impl ScriptedMarket {
    fn new(spot: f64) -> Self {
        Self {
            spot,
            historical: 1700.0,
            rate: 1.25,
            fail_spot: false,
            historical_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedMarket {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn get_spot_price(&self, _currency: &str) -> Result<(f64, DateTime<Utc>), CoreError> {
        if self.fail_spot {
            return Err(CoreError::Network("scripted outage".to_string()));
        }
        Ok((self.spot, Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()))
    }

    async fn get_historical_spot_price(
        &self,
        _date: NaiveDate,
        _currency: &str,
    ) -> Result<f64, CoreError> {
        self.historical_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.historical)
    }

    async fn get_exchange_rate(&self, _from: &str, _to: &str) -> Result<f64, CoreError> {
        Ok(self.rate)
    }
}

struct FixedRetail(f64);

#[async_trait]
impl RetailPriceProvider for FixedRetail {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn get_retail_price(&self, _product_url: &str) -> Result<f64, CoreError> {
        Ok(self.0)
    }
}

fn tracker_with_market(dir: &std::path::Path, market: ScriptedMarket) -> GoldTracker {
    let mut tracker = GoldTracker::open(dir);
    tracker.set_market_provider(Box::new(market));
    tracker
}

mod persistence {
    use super::*;

    #[test]
    fn a_fresh_directory_starts_empty_in_gbp() {
        let dir = tempdir().unwrap();
        let tracker = GoldTracker::open(dir.path());

        assert!(tracker.records().is_empty());
        assert!(tracker.snapshot().is_none());
        assert_eq!(tracker.config().currency, "GBP");
    }

    #[test]
    fn purchases_survive_a_reopen_and_ids_keep_advancing() {
        let dir = tempdir().unwrap();
        {
            let mut tracker = GoldTracker::open(dir.path());
            let first = tracker
                .add_purchase(
                    "Britannia",
                    WeightSpec::Coin(CoinSize::OneOunce),
                    1500.0,
                    make_date(2024, 1, 10),
                    true,
                )
                .unwrap();
            tracker
                .add_purchase(
                    "bar",
                    WeightSpec::FreeForm("20g".to_string()),
                    950.0,
                    make_date(2024, 2, 1),
                    false,
                )
                .unwrap();
            tracker.remove_purchase(first).unwrap();
        }

        let mut tracker = GoldTracker::open(dir.path());
        assert_eq!(tracker.records().len(), 1);
        assert_eq!(tracker.records()[0].name, "bar");

        // The counter came back from disk: the removed id is never reissued
        let next = tracker
            .add_purchase(
                "another",
                WeightSpec::FreeForm("5g".to_string()),
                250.0,
                make_date(2024, 3, 1),
                false,
            )
            .unwrap();
        assert_eq!(next, 3);
    }

    #[test]
    fn removing_an_unknown_id_is_purchase_not_found() {
        let dir = tempdir().unwrap();
        let mut tracker = GoldTracker::open(dir.path());
        assert!(matches!(
            tracker.remove_purchase(42),
            Err(CoreError::PurchaseNotFound(42))
        ));
    }

    #[tokio::test]
    async fn a_refreshed_snapshot_survives_a_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut tracker = tracker_with_market(dir.path(), ScriptedMarket::new(1850.0));
            let snapshot = tracker.ensure_spot_fresh().await.unwrap();
            assert_eq!(snapshot.price_per_oz, 1850.0);
        }

        let tracker = GoldTracker::open(dir.path());
        assert_eq!(tracker.snapshot().unwrap().price_per_oz, 1850.0);
        assert_eq!(tracker.snapshot().unwrap().currency, "GBP");
    }
}

mod settings {
    use super::*;

    #[test]
    fn api_keys_are_validated_then_persisted() {
        let dir = tempdir().unwrap();
        {
            let mut tracker = GoldTracker::open(dir.path());
            assert!(matches!(
                tracker.set_api_key("too-short".to_string()),
                Err(CoreError::ValidationError(_))
            ));
            tracker.set_api_key("f".repeat(32)).unwrap();
        }

        let tracker = GoldTracker::open(dir.path());
        assert!(tracker.config().has_api_key());
    }

    #[tokio::test]
    async fn a_currency_change_commits_inventory_and_config_together() {
        let dir = tempdir().unwrap();
        {
            let mut tracker = tracker_with_market(dir.path(), ScriptedMarket::new(2300.0));
            tracker
                .add_purchase(
                    "Britannia",
                    WeightSpec::Coin(CoinSize::OneOunce),
                    1500.0,
                    make_date(2024, 1, 10),
                    true,
                )
                .unwrap();
            tracker.change_currency("usd").await.unwrap();
            assert_eq!(tracker.config().currency, "USD");
        }

        let tracker = GoldTracker::open(dir.path());
        assert_eq!(tracker.config().currency, "USD");
        assert!((tracker.records()[0].price - 1875.0).abs() < 1e-9);
        assert_eq!(tracker.snapshot().unwrap().currency, "USD");
        assert_eq!(tracker.snapshot().unwrap().price_per_oz, 2300.0);
    }

    #[tokio::test]
    async fn a_failed_currency_change_leaves_everything_as_it_was() {
        let dir = tempdir().unwrap();
        {
            let mut tracker = tracker_with_market(dir.path(), ScriptedMarket::new(2300.0));
            tracker
                .add_purchase(
                    "Britannia",
                    WeightSpec::Coin(CoinSize::OneOunce),
                    1500.0,
                    make_date(2024, 1, 10),
                    true,
                )
                .unwrap();

            let mut failing = ScriptedMarket::new(2300.0);
            failing.fail_spot = true;
            tracker.set_market_provider(Box::new(failing));

            assert!(tracker.change_currency("USD").await.is_err());
            assert_eq!(tracker.config().currency, "GBP");
        }

        let tracker = GoldTracker::open(dir.path());
        assert_eq!(tracker.config().currency, "GBP");
        assert_eq!(tracker.records()[0].price, 1500.0);
    }
}

mod valuation {
    use super::*;

    #[test]
    fn empty_portfolio_values_to_zero_without_a_snapshot() {
        let dir = tempdir().unwrap();
        let tracker = GoldTracker::open(dir.path());
        let summary = tracker.valuation().unwrap();
        assert_eq!(summary.total_value, 0.0);
        assert_eq!(summary.profit_loss, 0.0);
    }

    #[tokio::test]
    async fn a_nonempty_portfolio_needs_a_snapshot_first() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_with_market(dir.path(), ScriptedMarket::new(1800.0));
        tracker
            .add_purchase(
                "Britannia",
                WeightSpec::Coin(CoinSize::OneOunce),
                1500.0,
                make_date(2024, 1, 10),
                true,
            )
            .unwrap();

        assert!(matches!(
            tracker.valuation(),
            Err(CoreError::SpotPriceUnavailable { .. })
        ));

        tracker.ensure_spot_fresh().await.unwrap();
        let summary = tracker.valuation().unwrap();
        assert!((summary.total_value - 1800.0).abs() < 1e-9);
        assert!((summary.profit_loss - 300.0).abs() < 1e-9);
        assert!((summary.tax_free_value - 1800.0).abs() < 1e-9);
    }
}

mod timeline {
    use super::*;

    #[tokio::test]
    async fn backfilled_prices_are_cached_on_disk_across_sessions() {
        let dir = tempdir().unwrap();

        let market = ScriptedMarket::new(1850.0);
        let calls = market.historical_calls.clone();
        {
            let mut tracker = tracker_with_market(dir.path(), market);
            for (name, date) in [("a", make_date(2024, 1, 5)), ("b", make_date(2024, 2, 5))] {
                tracker
                    .add_purchase(
                        name,
                        WeightSpec::Coin(CoinSize::OneOunce),
                        1500.0,
                        date,
                        true,
                    )
                    .unwrap();
            }
            let outcome = tracker.build_timeline().await.unwrap();
            assert_eq!(outcome.points().len(), 2);
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        // New session, new provider instance sharing the tally: the cached
        // values came back from disk, so nothing is refetched.
        let mut market = ScriptedMarket::new(1850.0);
        market.historical_calls = calls.clone();
        let mut tracker = tracker_with_market(dir.path(), market);

        let outcome = tracker.build_timeline().await.unwrap();
        assert_eq!(outcome.points().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Cumulative value: 1oz then 2oz at the scripted historical price
        assert!((outcome.points()[1].total_value - 2.0 * 1700.0).abs() < 1e-9);
    }
}

mod command_surface {
    use super::*;

    #[tokio::test]
    async fn quit_ends_the_session_silently() {
        let dir = tempdir().unwrap();
        let mut tracker = GoldTracker::open(dir.path());

        let output = commands::execute(&mut tracker, Command::Quit).await;
        assert!(output.quit);
        assert!(output.lines.is_empty());
    }

    #[tokio::test]
    async fn viewing_an_empty_inventory_says_so() {
        let dir = tempdir().unwrap();
        let mut tracker = GoldTracker::open(dir.path());

        let output = commands::execute(&mut tracker, Command::ViewInventory).await;
        assert!(!output.quit);
        assert_eq!(output.lines, vec!["Inventory is empty".to_string()]);
    }

    #[tokio::test]
    async fn a_coin_preset_without_a_price_uses_the_retail_quote() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_with_market(dir.path(), ScriptedMarket::new(1850.0));
        tracker.set_retail_provider(Box::new(FixedRetail(1916.43)));

        let output = commands::execute(
            &mut tracker,
            Command::AddPurchase {
                name: "Britannia".to_string(),
                weight: WeightSpec::Coin(CoinSize::OneOunce),
                price: None,
                date: make_date(2024, 5, 1),
                is_tax_free: true,
            },
        )
        .await;

        assert!(output.lines[0].contains("1916.43"));
        assert_eq!(tracker.records().len(), 1);
        assert!((tracker.records()[0].price - 1916.43).abs() < 1e-9);
        assert!((tracker.records()[0].weight_grams - GRAMS_PER_TROY_OUNCE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn a_custom_weight_without_a_price_is_rejected() {
        let dir = tempdir().unwrap();
        let mut tracker = GoldTracker::open(dir.path());

        let output = commands::execute(
            &mut tracker,
            Command::AddPurchase {
                name: "bar".to_string(),
                weight: WeightSpec::FreeForm("20g".to_string()),
                price: None,
                date: make_date(2024, 5, 1),
                is_tax_free: false,
            },
        )
        .await;

        assert!(output.lines[0].contains("price is required"));
        assert!(tracker.records().is_empty());
    }

    #[tokio::test]
    async fn view_inventory_lists_records_and_totals() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_with_market(dir.path(), ScriptedMarket::new(1800.0));
        tracker
            .add_purchase(
                "Britannia",
                WeightSpec::Coin(CoinSize::OneOunce),
                1500.0,
                make_date(2024, 1, 10),
                true,
            )
            .unwrap();

        let output = commands::execute(&mut tracker, Command::ViewInventory).await;
        let text = output.lines.join("\n");
        assert!(text.contains("Britannia"));
        assert!(text.contains("CGT-free"));
        assert!(text.contains("Total value:"));
        assert!(text.contains("1800.00 GBP"));
    }

    #[tokio::test]
    async fn show_graph_renders_once_there_is_data() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_with_market(dir.path(), ScriptedMarket::new(1850.0));

        let empty = commands::execute(
            &mut tracker,
            Command::ShowGraph { width: 60, height: 20 },
        )
        .await;
        assert_eq!(empty.lines, vec!["Not enough data to draw a graph".to_string()]);

        for date in [make_date(2024, 1, 5), make_date(2024, 3, 5)] {
            tracker
                .add_purchase(
                    "coin",
                    WeightSpec::Coin(CoinSize::OneOunce),
                    1500.0,
                    date,
                    true,
                )
                .unwrap();
        }

        let output = commands::execute(
            &mut tracker,
            Command::ShowGraph { width: 60, height: 20 },
        )
        .await;
        assert_eq!(output.lines.len(), 23);
        assert!(output.lines.iter().any(|l| l.contains('*')));
    }

    #[tokio::test]
    async fn removal_messages_distinguish_hit_from_miss() {
        let dir = tempdir().unwrap();
        let mut tracker = GoldTracker::open(dir.path());
        let id = tracker
            .add_purchase(
                "coin",
                WeightSpec::FreeForm("10g".to_string()),
                500.0,
                make_date(2024, 4, 1),
                false,
            )
            .unwrap();

        let hit = commands::execute(&mut tracker, Command::RemovePurchase { id }).await;
        assert!(hit.lines[0].contains("Removed"));

        let miss = commands::execute(&mut tracker, Command::RemovePurchase { id }).await;
        assert!(miss.lines[0].contains("No purchase"));
    }
}

mod retail_scraping {
    use super::*;

    const PRODUCT_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div data-module="product"
     data-product-settings='{"pricing":[{"Quantity":25,"PriceString":"£1,899.10"},{"Quantity":1,"PriceString":"£1,916.43"}],"sku":"UKB25GQT"}'>
</div>
</body></html>"#;

    #[test]
    fn the_single_unit_price_is_extracted_from_the_pricing_table() {
        let price = parse_product_price(PRODUCT_PAGE, "https://example.test/coin").unwrap();
        assert!((price - 1916.43).abs() < 1e-9);
    }

    #[test]
    fn a_page_without_the_product_module_is_product_not_found() {
        let err = parse_product_price("<html><body></body></html>", "https://example.test/coin")
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn a_pricing_table_without_a_single_unit_tier_is_product_not_found() {
        let page = r#"<div data-module="product"
            data-product-settings='{"pricing":[{"Quantity":10,"PriceString":"£100.00"}]}'></div>"#;
        assert!(matches!(
            parse_product_price(page, "url"),
            Err(CoreError::ProductNotFound(_))
        ));
    }
}
