use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point of the portfolio-history series: the portfolio as it stood
/// after the purchase on `date`, valued at that date's spot price.
///
/// Derived data — never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,

    /// Cumulative held weight to date, valued at this date's spot price
    pub total_value: f64,

    /// Cumulative cost basis to date
    pub total_cost: f64,

    /// `total_value - total_cost`
    pub profit_loss: f64,
}

/// Result of timeline reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineOutcome {
    /// Chronological points, at most one per record
    Series(Vec<TimelinePoint>),

    /// Empty inventory, or every historical-price fetch failed
    Unavailable,
}

impl TimelineOutcome {
    #[must_use]
    pub fn points(&self) -> &[TimelinePoint] {
        match self {
            TimelineOutcome::Series(points) => points,
            TimelineOutcome::Unavailable => &[],
        }
    }
}
