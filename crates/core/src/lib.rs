pub mod commands;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};

use errors::CoreError;
use models::config::Config;
use models::inventory::{Inventory, MarketSnapshot};
use models::purchase::{CoinSize, PurchaseRecord};
use models::timeline::TimelineOutcome;
use models::valuation::ValuationSummary;
use providers::metalpriceapi::MetalPriceApiProvider;
use providers::royal_mint::RoyalMintScraper;
use providers::traits::{MarketDataProvider, RetailPriceProvider};
use services::chart_service::ChartService;
use services::currency_service::{CurrencyService, RebaseOutcome};
use services::inventory_service::{InventoryService, WeightSpec};
use services::price_service::{PriceService, RefreshOutcome};
use services::timeline_service::TimelineService;
use services::valuation_service::ValuationService;

const INVENTORY_FILE: &str = "inventory.json";
const CONFIG_FILE: &str = "config.json";

/// Main entry point for the Gold Tracker core library.
///
/// Owns the inventory and config documents plus the services and gateway
/// handles that operate on them. Every mutation is persisted immediately;
/// operations that must be atomic (spot refresh, currency rebase) either
/// fully commit or leave state untouched.
#[must_use]
pub struct GoldTracker {
    inventory: Inventory,
    config: Config,
    inventory_path: PathBuf,
    config_path: PathBuf,
    market: Box<dyn MarketDataProvider>,
    retail: Box<dyn RetailPriceProvider>,
    inventory_service: InventoryService,
    price_service: PriceService,
    currency_service: CurrencyService,
    valuation_service: ValuationService,
    timeline_service: TimelineService,
    chart_service: ChartService,
}

impl std::fmt::Debug for GoldTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoldTracker")
            .field("records", &self.inventory.len())
            .field("currency", &self.config.currency)
            .field("snapshot", &self.inventory.snapshot)
            .finish()
    }
}

impl GoldTracker {
    /// Open (or initialize) the tracker in a data directory. Missing or
    /// corrupt documents start empty/default — never an error.
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        let inventory_path = dir.join(INVENTORY_FILE);
        let config_path = dir.join(CONFIG_FILE);

        let config = storage::store::StorageManager::load_config(&config_path);
        let inventory =
            storage::store::StorageManager::load_inventory(&inventory_path, &config.currency);
        let market = Box::new(MetalPriceApiProvider::new(config.api_key.clone()));

        Self::build(inventory, config, inventory_path, config_path, market)
    }

    /// Swap the market-data gateway (tests, alternative APIs).
    pub fn set_market_provider(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.market = provider;
    }

    /// Swap the retail-price gateway.
    pub fn set_retail_provider(&mut self, provider: Box<dyn RetailPriceProvider>) {
        self.retail = provider;
    }

    // ── Inventory ───────────────────────────────────────────────────

    /// Add a purchase and persist the inventory.
    pub fn add_purchase(
        &mut self,
        name: impl Into<String>,
        weight: WeightSpec,
        price: f64,
        date: NaiveDate,
        is_tax_free: bool,
    ) -> Result<u64, CoreError> {
        let id = self.inventory_service.add_purchase(
            &mut self.inventory,
            name,
            weight,
            price,
            date,
            is_tax_free,
        )?;
        self.save_inventory()?;
        Ok(id)
    }

    /// Remove a purchase by id and persist. An absent id is
    /// [`CoreError::PurchaseNotFound`]; the store itself treats it as a
    /// no-op, so nothing is saved in that case.
    pub fn remove_purchase(&mut self, id: u64) -> Result<(), CoreError> {
        if !self.inventory_service.remove_purchase(&mut self.inventory, id) {
            return Err(CoreError::PurchaseNotFound(id));
        }
        self.save_inventory()
    }

    /// All purchases, insertion order.
    #[must_use]
    pub fn records(&self) -> &[PurchaseRecord] {
        &self.inventory.records
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        self.inventory.snapshot.as_ref()
    }

    // ── Market data ─────────────────────────────────────────────────

    /// Make sure the spot-price snapshot is inside the 24-hour freshness
    /// window, fetching and persisting a new one if not.
    pub async fn ensure_spot_fresh(&mut self) -> Result<&MarketSnapshot, CoreError> {
        let outcome = self
            .price_service
            .ensure_fresh(
                self.market.as_ref(),
                &mut self.inventory,
                &self.config.currency,
                Utc::now(),
            )
            .await?;

        if outcome == RefreshOutcome::Refreshed {
            self.save_inventory()?;
        }

        self.inventory
            .snapshot
            .as_ref()
            .ok_or_else(|| CoreError::SpotPriceUnavailable {
                currency: self.config.currency.clone(),
            })
    }

    /// Current retail price for a standard CGT-free coin size.
    pub async fn retail_quote(&self, size: CoinSize) -> Result<f64, CoreError> {
        self.retail.get_retail_price(size.product_url()).await
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Aggregate metrics at the current snapshot price. An empty inventory
    /// yields all-zero metrics even without a snapshot; otherwise a
    /// snapshot is required (call `ensure_spot_fresh` first).
    pub fn valuation(&self) -> Result<ValuationSummary, CoreError> {
        if self.inventory.is_empty() {
            return Ok(ValuationSummary::default());
        }
        let snapshot = self.inventory.snapshot.as_ref().ok_or_else(|| {
            CoreError::SpotPriceUnavailable {
                currency: self.config.currency.clone(),
            }
        })?;
        Ok(self
            .valuation_service
            .summarize(&self.inventory.records, snapshot.price_per_oz))
    }

    // ── Timeline & chart ────────────────────────────────────────────

    /// Rebuild the portfolio-history series, backfilling and caching any
    /// missing historical spot prices (persisted once, at the end).
    pub async fn build_timeline(&mut self) -> Result<TimelineOutcome, CoreError> {
        let build = self
            .timeline_service
            .reconstruct(self.market.as_ref(), &mut self.inventory, &self.config.currency)
            .await;

        if build.records_updated {
            self.save_inventory()?;
        }
        Ok(build.outcome)
    }

    /// Render a timeline onto a character grid of the given size.
    #[must_use]
    pub fn render_chart(
        &self,
        outcome: &TimelineOutcome,
        width: usize,
        height: usize,
    ) -> Vec<String> {
        self.chart_service.render(outcome.points(), width, height)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Store a new API key and rebuild the market gateway so it takes
    /// effect immediately.
    pub fn set_api_key(&mut self, key: String) -> Result<(), CoreError> {
        Config::validate_api_key(&key)?;
        self.config.api_key = key;
        self.market = Box::new(MetalPriceApiProvider::new(self.config.api_key.clone()));
        self.save_config()
    }

    /// Change the display currency, rebasing every monetary field in the
    /// inventory. All-or-nothing: on any gateway failure nothing is
    /// mutated or saved and the prior currency stays in effect.
    pub async fn change_currency(&mut self, new_currency: &str) -> Result<RebaseOutcome, CoreError> {
        let outcome = self
            .currency_service
            .rebase(
                self.market.as_ref(),
                &self.inventory,
                &self.config.currency,
                new_currency,
            )
            .await?;

        if let RebaseOutcome::Rebased {
            inventory,
            currency,
            ..
        } = &outcome
        {
            self.inventory = inventory.clone();
            self.save_inventory()?;
            self.config.currency = currency.clone();
            self.save_config()?;
        }
        Ok(outcome)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(
        inventory: Inventory,
        config: Config,
        inventory_path: PathBuf,
        config_path: PathBuf,
        market: Box<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            inventory,
            config,
            inventory_path,
            config_path,
            market,
            retail: Box::new(RoyalMintScraper::new()),
            inventory_service: InventoryService::new(),
            price_service: PriceService::new(),
            currency_service: CurrencyService::new(),
            valuation_service: ValuationService::new(),
            timeline_service: TimelineService::new(),
            chart_service: ChartService::new(),
        }
    }

    fn save_inventory(&self) -> Result<(), CoreError> {
        storage::store::StorageManager::save_inventory(&self.inventory_path, &self.inventory)
    }

    fn save_config(&self) -> Result<(), CoreError> {
        storage::store::StorageManager::save_config(&self.config_path, &self.config)
    }
}
