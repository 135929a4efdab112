//! Strategy callback trait and the two concrete strategies.
//!
//! Control flow belongs to the host:
//! 1. `initialize` once at startup
//! 2. `on_schedule_trigger` on the registered calendar rule
//! 3. `on_data` for every data event, strictly sequentially
//!
//! A strategy answers `on_data` with the rebalance it performed (if any).
//! Host failures come back as `StrategyError` instead of being swallowed.

pub mod cape;
pub mod dual_momentum;

pub use cape::{CapeStrategy, CapeStrategyConfig};
pub use dual_momentum::{
    decide_rotation, DualMomentum, DualMomentumConfig, Regime, RotationDecision,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DataSlice, Symbol};
use crate::host::{HostError, StrategyHost};
use crate::score::MAX_MOMENTUM_WINDOW;

/// Errors surfaced by strategy callbacks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("host rejected request: {0}")]
    Host(#[from] HostError),

    #[error("{basket} basket is empty")]
    EmptyBasket { basket: &'static str },

    #[error(
        "momentum windows must be between 1 and {max}, got {0:?}",
        max = MAX_MOMENTUM_WINDOW
    )]
    InvalidWindows([usize; 4]),
}

/// One target weight requested during a rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetWeight {
    pub symbol: Symbol,
    pub weight: f64,
}

/// What a strategy did on a rebalancing data event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rebalance {
    pub date: NaiveDate,
    /// Whether the whole portfolio was liquidated before the targets were set.
    pub liquidated: bool,
    pub targets: Vec<TargetWeight>,
}

/// Host-driven strategy callbacks.
pub trait Strategy: Send {
    /// Stable identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Register subscriptions, indicators, schedule and benchmark.
    fn initialize(&mut self, host: &mut dyn StrategyHost);

    /// Calendar trigger fired by the host (month-end, after open).
    fn on_schedule_trigger(&mut self, host: &mut dyn StrategyHost);

    /// New data arrived. Returns the rebalance performed on this event, if any.
    fn on_data(
        &mut self,
        data: &DataSlice,
        host: &mut dyn StrategyHost,
    ) -> Result<Option<Rebalance>, StrategyError>;
}
