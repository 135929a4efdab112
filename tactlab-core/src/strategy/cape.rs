//! CAPE allocation: hold `clamp(1 - cape, lower, upper)` of each tracked instrument.
//!
//! The CAPE series arrives as a custom dataset. Each data event first checks
//! the latch against the CAPE value cached from earlier events, then caches
//! any CAPE record carried by the current event.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Rebalance, Strategy, StrategyError, TargetWeight};
use crate::cape::WeightBounds;
use crate::domain::{DataSlice, Symbol};
use crate::host::{ScheduleRule, StrategyHost, Subscription};
use crate::latch::RebalanceLatch;

/// Configuration for [`CapeStrategy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapeStrategyConfig {
    /// Instruments whose holdings follow the CAPE weight.
    pub symbols: Vec<Symbol>,
    /// Identifier of the CAPE custom dataset in data slices.
    pub dataset: String,
    pub bounds: WeightBounds,
    /// Reference instrument for the month-end rule and the benchmark.
    pub reference: Symbol,
    pub schedule_offset_minutes: u32,
}

impl Default for CapeStrategyConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["SPX".to_string()],
            dataset: "CAPE".to_string(),
            bounds: WeightBounds::default(),
            reference: "SPX".to_string(),
            schedule_offset_minutes: 0,
        }
    }
}

/// Monthly CAPE-weighted allocation.
#[derive(Debug, Clone)]
pub struct CapeStrategy {
    config: CapeStrategyConfig,
    latch: RebalanceLatch,
    current_cape: Option<f64>,
}

impl CapeStrategy {
    pub fn new(config: CapeStrategyConfig) -> Self {
        Self {
            config,
            latch: RebalanceLatch::armed(),
            current_cape: None,
        }
    }

    pub fn config(&self) -> &CapeStrategyConfig {
        &self.config
    }

    /// Last CAPE value seen in a data event.
    pub fn current_cape(&self) -> Option<f64> {
        self.current_cape
    }

    pub fn latch(&self) -> RebalanceLatch {
        self.latch
    }

    fn rebalance(
        &self,
        cape: f64,
        data: &DataSlice,
        host: &mut dyn StrategyHost,
    ) -> Result<Rebalance, StrategyError> {
        let weight = self.config.bounds.weight_for(cape);
        let mut targets = Vec::with_capacity(self.config.symbols.len());

        for symbol in &self.config.symbols {
            host.set_target_weight(symbol, weight)?;
            info!(
                date = %data.date,
                symbol = %symbol,
                cape,
                weight,
                "rebalanced"
            );
            targets.push(TargetWeight {
                symbol: symbol.clone(),
                weight,
            });
        }

        Ok(Rebalance {
            date: data.date,
            liquidated: false,
            targets,
        })
    }
}

impl Default for CapeStrategy {
    fn default() -> Self {
        Self::new(CapeStrategyConfig::default())
    }
}

impl Strategy for CapeStrategy {
    fn name(&self) -> &str {
        "cape"
    }

    fn initialize(&mut self, host: &mut dyn StrategyHost) {
        self.current_cape = None;
        self.latch = RebalanceLatch::armed();

        host.subscribe(Subscription::Custom(self.config.dataset.clone()));
        for symbol in &self.config.symbols {
            host.subscribe(Subscription::Equity(symbol.clone()));
        }
        host.schedule(ScheduleRule::MonthEndAfterOpen {
            reference: self.config.reference.clone(),
            offset_minutes: self.config.schedule_offset_minutes,
        });
        host.set_benchmark(&self.config.reference);
    }

    fn on_schedule_trigger(&mut self, host: &mut dyn StrategyHost) {
        self.latch.arm();
        debug!(date = %host.today(), "rebalance armed");
    }

    fn on_data(
        &mut self,
        data: &DataSlice,
        host: &mut dyn StrategyHost,
    ) -> Result<Option<Rebalance>, StrategyError> {
        // No CAPE yet: leave the latch armed for a later event.
        let outcome = match self.current_cape {
            Some(cape) if self.latch.consume() => self.rebalance(cape, data, host).map(Some),
            _ => Ok(None),
        };

        // A failed rebalance leaves the cached CAPE untouched.
        if let Err(err) = &outcome {
            warn!(date = %data.date, error = %err, "cape rebalance failed");
            return outcome;
        }

        if let Some(record) = data.cape(&self.config.dataset) {
            self.current_cape = Some(record.value);
            debug!(date = %data.date, cape = record.value, "cape updated");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cape::CapeRecord;
    use crate::domain::Observation;
    use crate::host::HostError;
    use chrono::NaiveDate;

    /// Minimal host that records weight requests and can be told to fail.
    #[derive(Default)]
    struct StubHost {
        weights: Vec<(String, f64)>,
        subscriptions: Vec<Subscription>,
        fail: bool,
    }

    impl StrategyHost for StubHost {
        fn today(&self) -> NaiveDate {
            NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()
        }
        fn subscribe(&mut self, subscription: Subscription) {
            self.subscriptions.push(subscription);
        }
        fn register_momentum(&mut self, _symbol: &str, _window: usize) {}
        fn momentum(&self, _symbol: &str, _window: usize) -> Option<f64> {
            None
        }
        fn schedule(&mut self, _rule: ScheduleRule) {}
        fn set_benchmark(&mut self, _symbol: &str) {}
        fn set_target_weight(&mut self, symbol: &str, weight: f64) -> Result<(), HostError> {
            if self.fail {
                return Err(HostError::Unavailable("down".into()));
            }
            self.weights.push((symbol.to_string(), weight));
            Ok(())
        }
        fn liquidate(&mut self, _symbol: &str) -> Result<(), HostError> {
            Ok(())
        }
        fn liquidate_all(&mut self) -> Result<(), HostError> {
            Ok(())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn cape_slice(d: u32, value: f64) -> DataSlice {
        DataSlice::new(day(d)).with(
            "CAPE",
            Observation::Cape(CapeRecord {
                date: day(d),
                value,
            }),
        )
    }

    fn price_slice(d: u32) -> DataSlice {
        DataSlice::new(day(d)).with("SPX", Observation::Price { close: 3200.0 })
    }

    #[test]
    fn initialize_registers_dataset_and_instrument() {
        let mut host = StubHost::default();
        let mut strategy = CapeStrategy::default();
        strategy.initialize(&mut host);
        assert_eq!(
            host.subscriptions,
            vec![
                Subscription::Custom("CAPE".into()),
                Subscription::Equity("SPX".into())
            ]
        );
    }

    #[test]
    fn no_action_before_first_cape() {
        let mut host = StubHost::default();
        let mut strategy = CapeStrategy::default();
        strategy.initialize(&mut host);

        let out = strategy.on_data(&price_slice(2), &mut host).unwrap();
        assert!(out.is_none());
        assert!(host.weights.is_empty());
        assert!(strategy.latch().is_armed());
    }

    #[test]
    fn decision_uses_previously_cached_cape() {
        let mut host = StubHost::default();
        let mut strategy = CapeStrategy::default();
        strategy.initialize(&mut host);

        // The first CAPE is cached but cannot drive a decision on the same event.
        assert!(strategy.on_data(&cape_slice(2, -0.2), &mut host).unwrap().is_none());
        assert_eq!(strategy.current_cape(), Some(-0.2));

        let out = strategy
            .on_data(&cape_slice(3, 40.0), &mut host)
            .unwrap()
            .unwrap();
        assert_eq!(out.targets.len(), 1);
        assert!((out.targets[0].weight - 1.2).abs() < 1e-12);
        assert_eq!(strategy.current_cape(), Some(40.0));
    }

    #[test]
    fn fires_once_per_trigger() {
        let mut host = StubHost::default();
        let mut strategy = CapeStrategy::default();
        strategy.initialize(&mut host);

        strategy.on_data(&cape_slice(2, 25.0), &mut host).unwrap();
        for d in 3..10 {
            strategy.on_data(&price_slice(d), &mut host).unwrap();
        }
        assert_eq!(host.weights.len(), 1);

        strategy.on_schedule_trigger(&mut host);
        for d in 10..20 {
            strategy.on_data(&price_slice(d), &mut host).unwrap();
        }
        assert_eq!(host.weights, vec![("SPX".into(), 0.5), ("SPX".into(), 0.5)]);
    }

    #[test]
    fn host_failure_is_surfaced_and_not_retried() {
        let mut host = StubHost {
            fail: true,
            ..Default::default()
        };
        let mut strategy = CapeStrategy::default();
        strategy.initialize(&mut host);
        strategy.on_data(&cape_slice(2, 25.0), &mut host).unwrap();

        let err = strategy.on_data(&cape_slice(3, 26.0), &mut host).unwrap_err();
        assert!(matches!(err, StrategyError::Host(HostError::Unavailable(_))));
        assert_eq!(strategy.current_cape(), Some(25.0));

        host.fail = false;
        assert!(strategy.on_data(&price_slice(4), &mut host).unwrap().is_none());
        assert!(host.weights.is_empty());
    }

    #[test]
    fn next_rebalance_after_failure_uses_value_from_before_the_failure() {
        let mut host = StubHost::default();
        let mut strategy = CapeStrategy::default();
        strategy.initialize(&mut host);
        strategy.on_data(&cape_slice(2, -0.4), &mut host).unwrap();

        host.fail = true;
        strategy.on_data(&cape_slice(3, 30.0), &mut host).unwrap_err();
        assert_eq!(strategy.current_cape(), Some(-0.4));

        host.fail = false;
        strategy.on_schedule_trigger(&mut host);
        strategy.on_data(&price_slice(4), &mut host).unwrap();
        assert_eq!(host.weights.len(), 1);
        assert!((host.weights[0].1 - 1.4).abs() < 1e-12);
    }

    #[test]
    fn every_tracked_symbol_gets_the_weight() {
        let mut host = StubHost::default();
        let mut strategy = CapeStrategy::new(CapeStrategyConfig {
            symbols: vec!["SPX".into(), "NDX".into()],
            ..Default::default()
        });
        strategy.initialize(&mut host);
        strategy.on_data(&cape_slice(2, 0.0), &mut host).unwrap();
        strategy.on_data(&price_slice(3), &mut host).unwrap();
        assert_eq!(host.weights, vec![("SPX".into(), 1.0), ("NDX".into(), 1.0)]);
    }
}
