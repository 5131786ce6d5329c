//! Request/response command surface over [`GoldTracker`].
//!
//! Each menu action is a [`Command`]; executing one yields printable lines
//! and a quit flag. Failures become message lines, never panics, so an
//! interactive front end can stay a dumb loop.

use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::services::currency_service::RebaseOutcome;
use crate::services::inventory_service::WeightSpec;
use crate::GoldTracker;

/// One user-initiated action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List every purchase with current valuation metrics.
    ViewInventory,
    /// Record a new purchase. A `None` price with a standard coin size is
    /// filled from the live retail quote.
    AddPurchase {
        name: String,
        weight: WeightSpec,
        price: Option<f64>,
        date: NaiveDate,
        is_tax_free: bool,
    },
    RemovePurchase { id: u64 },
    ChangeApiKey { key: String },
    ChangeCurrency { currency: String },
    /// Render the portfolio-history chart at the given grid size.
    ShowGraph { width: usize, height: usize },
    Quit,
}

/// What a command produced: lines for the caller to display, and whether
/// the session should end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl CommandOutput {
    fn message(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            quit: false,
        }
    }

    fn from_lines(lines: Vec<String>) -> Self {
        Self { lines, quit: false }
    }
}

/// Execute a command against the tracker.
pub async fn execute(tracker: &mut GoldTracker, command: Command) -> CommandOutput {
    match command {
        Command::ViewInventory => view_inventory(tracker).await,
        Command::AddPurchase {
            name,
            weight,
            price,
            date,
            is_tax_free,
        } => add_purchase(tracker, name, weight, price, date, is_tax_free).await,
        Command::RemovePurchase { id } => match tracker.remove_purchase(id) {
            Ok(()) => CommandOutput::message(format!("Removed purchase {id}")),
            Err(CoreError::PurchaseNotFound(_)) => {
                CommandOutput::message(format!("No purchase with id {id}"))
            }
            Err(e) => CommandOutput::message(format!("Could not remove purchase: {e}")),
        },
        Command::ChangeApiKey { key } => match tracker.set_api_key(key) {
            Ok(()) => CommandOutput::message("API key updated"),
            Err(e) => CommandOutput::message(format!("API key rejected: {e}")),
        },
        Command::ChangeCurrency { currency } => change_currency(tracker, &currency).await,
        Command::ShowGraph { width, height } => show_graph(tracker, width, height).await,
        Command::Quit => CommandOutput {
            lines: Vec::new(),
            quit: true,
        },
    }
}

async fn view_inventory(tracker: &mut GoldTracker) -> CommandOutput {
    if tracker.records().is_empty() {
        return CommandOutput::message("Inventory is empty");
    }

    if let Err(e) = tracker.ensure_spot_fresh().await {
        return CommandOutput::message(format!("Could not fetch spot price: {e}"));
    }

    let mut lines = Vec::new();
    for record in tracker.records() {
        let tag = if record.is_tax_free { " (CGT-free)" } else { "" };
        lines.push(format!(
            "{:>4}  {}  {:.4} g  {:.2}  {}{}",
            record.id, record.date, record.weight_grams, record.price, record.name, tag
        ));
    }

    match tracker.valuation() {
        Ok(summary) => {
            let currency = tracker.config().currency.clone();
            lines.push(String::new());
            lines.push(format!(
                "Total weight: {:.4} g ({:.4} oz)",
                summary.total_weight_grams, summary.total_weight_oz
            ));
            lines.push(format!("Total value:  {:.2} {currency}", summary.total_value));
            lines.push(format!("Total cost:   {:.2} {currency}", summary.total_cost));
            lines.push(format!("Profit/loss:  {:.2} {currency}", summary.profit_loss));
            lines.push(format!(
                "CGT-free value: {:.2} {currency}, other: {:.2} {currency}",
                summary.tax_free_value, summary.non_tax_free_value
            ));
        }
        Err(e) => lines.push(format!("Valuation unavailable: {e}")),
    }
    CommandOutput::from_lines(lines)
}

async fn add_purchase(
    tracker: &mut GoldTracker,
    name: String,
    weight: WeightSpec,
    price: Option<f64>,
    date: NaiveDate,
    is_tax_free: bool,
) -> CommandOutput {
    let price = match price {
        Some(p) => p,
        None => match &weight {
            WeightSpec::Coin(size) => match tracker.retail_quote(*size).await {
                Ok(quote) => quote,
                Err(e) => {
                    return CommandOutput::message(format!(
                        "Could not fetch retail price for {size}: {e}"
                    ))
                }
            },
            WeightSpec::FreeForm(_) => {
                return CommandOutput::message("A price is required for custom weights")
            }
        },
    };

    match tracker.add_purchase(name, weight, price, date, is_tax_free) {
        Ok(id) => CommandOutput::message(format!("Added purchase {id} at {price:.2}")),
        Err(e) => CommandOutput::message(format!("Could not add purchase: {e}")),
    }
}

async fn change_currency(tracker: &mut GoldTracker, currency: &str) -> CommandOutput {
    match tracker.change_currency(currency).await {
        Ok(RebaseOutcome::Unchanged) => {
            CommandOutput::message(format!("Currency is already {}", tracker.config().currency))
        }
        Ok(RebaseOutcome::Rebased { currency, rate, .. }) => CommandOutput::message(format!(
            "Converted inventory to {currency} at rate {rate:.6}"
        )),
        Err(e) => CommandOutput::message(format!("Currency change aborted: {e}")),
    }
}

async fn show_graph(tracker: &mut GoldTracker, width: usize, height: usize) -> CommandOutput {
    match tracker.build_timeline().await {
        Ok(outcome) => {
            let lines = tracker.render_chart(&outcome, width, height);
            if lines.is_empty() {
                CommandOutput::message("Not enough data to draw a graph")
            } else {
                CommandOutput::from_lines(lines)
            }
        }
        Err(e) => CommandOutput::message(format!("Could not build timeline: {e}")),
    }
}
