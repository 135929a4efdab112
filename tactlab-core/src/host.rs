//! Host contract: what a strategy may ask of the engine that runs it.
//!
//! The host owns data subscription, scheduling, indicator computation,
//! order generation and portfolio state. A strategy registers what it needs
//! in `initialize` and afterwards only reads indicator values and issues
//! portfolio requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A data subscription requested during initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subscription {
    /// Daily bars for a tradable equity.
    Equity(String),
    /// A custom dataset (e.g. the CAPE series) keyed by its identifier.
    Custom(String),
}

impl Subscription {
    pub fn id(&self) -> &str {
        match self {
            Subscription::Equity(id) | Subscription::Custom(id) => id,
        }
    }
}

/// Calendar rule for the scheduled rebalance trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleRule {
    /// Last trading day of each month of `reference`, `offset_minutes` after the open.
    MonthEndAfterOpen {
        reference: String,
        offset_minutes: u32,
    },
}

/// Failures reported by the host when a portfolio request cannot be honoured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("instrument '{symbol}' is not subscribed")]
    UnknownInstrument { symbol: String },

    #[error("target weight {weight} for '{symbol}' rejected: {reason}")]
    WeightRejected {
        symbol: String,
        weight: f64,
        reason: String,
    },

    #[error("host unavailable: {0}")]
    Unavailable(String),
}

/// The engine side of the strategy callback contract.
///
/// Strategies receive `&mut dyn StrategyHost` in every callback. Registration
/// methods are expected during `initialize`; queries and portfolio requests
/// during `on_schedule_trigger` / `on_data`.
pub trait StrategyHost {
    /// Current engine date (used for log context only).
    fn today(&self) -> NaiveDate;

    fn subscribe(&mut self, subscription: Subscription);

    /// Ask the host to maintain a momentum-percent indicator for `symbol`
    /// over `window` daily bars.
    fn register_momentum(&mut self, symbol: &str, window: usize);

    /// Latest momentum-percent reading, or `None` if not registered or not warm.
    fn momentum(&self, symbol: &str, window: usize) -> Option<f64>;

    fn schedule(&mut self, rule: ScheduleRule);

    fn set_benchmark(&mut self, symbol: &str);

    fn set_target_weight(&mut self, symbol: &str, weight: f64) -> Result<(), HostError>;

    fn liquidate(&mut self, symbol: &str) -> Result<(), HostError>;

    fn liquidate_all(&mut self) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_id() {
        assert_eq!(Subscription::Equity("SPY".into()).id(), "SPY");
        assert_eq!(Subscription::Custom("CAPE".into()).id(), "CAPE");
    }

    #[test]
    fn host_error_messages() {
        let err = HostError::WeightRejected {
            symbol: "SPX".into(),
            weight: 1.5,
            reason: "leverage disabled".into(),
        };
        assert_eq!(
            err.to_string(),
            "target weight 1.5 for 'SPX' rejected: leverage disabled"
        );
    }
}
