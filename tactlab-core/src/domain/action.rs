//! Requests a strategy issues to its host.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Symbol;

/// A portfolio request. The host turns these into orders; the strategy never sees fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    /// Hold `weight` × portfolio value in `symbol`.
    SetTargetWeight { symbol: Symbol, weight: f64 },
    /// Close every open position in `symbol`.
    Liquidate { symbol: Symbol },
    /// Close every open position in the portfolio.
    LiquidateAll,
}

impl HostAction {
    /// Short label used in logs and CSV exports.
    pub fn label(&self) -> &'static str {
        match self {
            HostAction::SetTargetWeight { .. } => "set_target_weight",
            HostAction::Liquidate { .. } => "liquidate",
            HostAction::LiquidateAll => "liquidate_all",
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            HostAction::SetTargetWeight { symbol, .. } | HostAction::Liquidate { symbol } => {
                Some(symbol)
            }
            HostAction::LiquidateAll => None,
        }
    }

    pub fn weight(&self) -> Option<f64> {
        match self {
            HostAction::SetTargetWeight { weight, .. } => Some(*weight),
            _ => None,
        }
    }
}

/// A host action stamped with the date it was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedAction {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub action: HostAction,
}
