//! `ReplayHost`: a strategy host that records instead of trading.
//!
//! Momentum readings come from `Roc` series precomputed over the loaded
//! closes when a strategy registers a window. Portfolio requests are stamped
//! with the current replay date and appended to the action log; nothing is
//! filled.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tactlab_core::domain::{HostAction, TimedAction};
use tactlab_core::host::{HostError, ScheduleRule, StrategyHost, Subscription};
use tactlab_core::indicators::{Indicator, IndicatorValues, Roc};
use tracing::debug;

use crate::price_loader::PriceSeries;

#[derive(Debug, Clone, Default)]
pub struct ReplayHost {
    today: NaiveDate,
    prices: BTreeMap<String, PriceSeries>,
    indicators: IndicatorValues,
    subscriptions: Vec<Subscription>,
    registered: BTreeSet<(String, usize)>,
    schedule: Option<ScheduleRule>,
    benchmark: Option<String>,
    actions: Vec<TimedAction>,
    weight_rejection: Option<String>,
}

fn momentum_key(symbol: &str, window: usize) -> String {
    format!("roc_{window}:{symbol}")
}

impl ReplayHost {
    pub fn new(prices: BTreeMap<String, PriceSeries>) -> Self {
        Self {
            prices,
            ..Self::default()
        }
    }

    /// Reject every `set_target_weight` request with `reason`.
    pub fn rejecting_weights(mut self, reason: impl Into<String>) -> Self {
        self.weight_rejection = Some(reason.into());
        self
    }

    pub fn set_today(&mut self, date: NaiveDate) {
        self.today = date;
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn registered_windows(&self) -> &BTreeSet<(String, usize)> {
        &self.registered
    }

    pub fn schedule_rule(&self) -> Option<&ScheduleRule> {
        self.schedule.as_ref()
    }

    pub fn benchmark(&self) -> Option<&str> {
        self.benchmark.as_deref()
    }

    pub fn actions(&self) -> &[TimedAction] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<TimedAction> {
        self.actions
    }

    fn is_tradable(&self, symbol: &str) -> bool {
        self.subscriptions
            .iter()
            .any(|s| matches!(s, Subscription::Equity(id) if id == symbol))
    }

    fn require_tradable(&self, symbol: &str) -> Result<(), HostError> {
        if self.is_tradable(symbol) {
            Ok(())
        } else {
            Err(HostError::UnknownInstrument {
                symbol: symbol.to_string(),
            })
        }
    }

    fn record(&mut self, action: HostAction) {
        debug!(
            date = %self.today,
            action = action.label(),
            symbol = ?action.symbol(),
            "host request"
        );
        self.actions.push(TimedAction {
            date: self.today,
            action,
        });
    }
}

impl StrategyHost for ReplayHost {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn subscribe(&mut self, subscription: Subscription) {
        if !self.subscriptions.contains(&subscription) {
            self.subscriptions.push(subscription);
        }
    }

    fn register_momentum(&mut self, symbol: &str, window: usize) {
        if window == 0 || !self.registered.insert((symbol.to_string(), window)) {
            return;
        }
        match self.prices.get(symbol) {
            Some(series) => {
                let values = Roc::new(window).compute(&series.closes);
                self.indicators.insert(momentum_key(symbol, window), values);
            }
            None => debug!(symbol, window, "no closes loaded; momentum will stay unavailable"),
        }
    }

    fn momentum(&self, symbol: &str, window: usize) -> Option<f64> {
        let idx = self.prices.get(symbol)?.index_on_or_before(self.today)?;
        self.indicators
            .get(&momentum_key(symbol, window), idx)
            .filter(|v| !v.is_nan())
    }

    fn schedule(&mut self, rule: ScheduleRule) {
        self.schedule = Some(rule);
    }

    fn set_benchmark(&mut self, symbol: &str) {
        self.benchmark = Some(symbol.to_string());
    }

    fn set_target_weight(&mut self, symbol: &str, weight: f64) -> Result<(), HostError> {
        self.require_tradable(symbol)?;
        if let Some(reason) = &self.weight_rejection {
            return Err(HostError::WeightRejected {
                symbol: symbol.to_string(),
                weight,
                reason: reason.clone(),
            });
        }
        self.record(HostAction::SetTargetWeight {
            symbol: symbol.to_string(),
            weight,
        });
        Ok(())
    }

    fn liquidate(&mut self, symbol: &str) -> Result<(), HostError> {
        self.require_tradable(symbol)?;
        self.record(HostAction::Liquidate {
            symbol: symbol.to_string(),
        });
        Ok(())
    }

    fn liquidate_all(&mut self) -> Result<(), HostError> {
        self.record(HostAction::LiquidateAll);
        Ok(())
    }
}
