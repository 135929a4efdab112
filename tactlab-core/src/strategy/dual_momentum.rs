//! Dual-momentum rotation (vigilant asset allocation).
//!
//! Every instrument in two baskets is scored with the 13612W momentum score.
//! If any growth instrument scores below zero the portfolio rotates fully
//! into the best defensive instrument, otherwise into the best growth
//! instrument. The whole portfolio is liquidated before the new target is set.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Rebalance, Strategy, StrategyError, TargetWeight};
use crate::domain::{DataSlice, Symbol};
use crate::host::{ScheduleRule, StrategyHost, Subscription};
use crate::latch::{RebalanceLatch, WarmupGate};
use crate::score::{
    rank_descending, MomentumScore, RankedInstrument, MAX_MOMENTUM_WINDOW, MOMENTUM_WINDOWS,
};

/// Configuration for [`DualMomentum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualMomentumConfig {
    /// Instruments rotated into while momentum is broadly positive.
    pub growth: Vec<Symbol>,
    /// Instruments rotated into when any growth instrument turns negative.
    pub defensive: Vec<Symbol>,
    /// 1, 3, 6 and 12 month windows in trading days.
    pub windows: [usize; 4],
    /// Reference instrument for the month-end rule and the benchmark.
    pub reference: Symbol,
    pub schedule_offset_minutes: u32,
}

impl Default for DualMomentumConfig {
    fn default() -> Self {
        Self {
            growth: ["SPY", "EFA", "EEM", "AGG"].map(String::from).to_vec(),
            defensive: ["LQD", "IEF", "SHY"].map(String::from).to_vec(),
            windows: MOMENTUM_WINDOWS,
            reference: "SPY".to_string(),
            schedule_offset_minutes: 10,
        }
    }
}

impl DualMomentumConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.growth.is_empty() {
            return Err(StrategyError::EmptyBasket { basket: "growth" });
        }
        if self.defensive.is_empty() {
            return Err(StrategyError::EmptyBasket { basket: "defensive" });
        }
        if self
            .windows
            .iter()
            .any(|&w| w == 0 || w > MAX_MOMENTUM_WINDOW)
        {
            return Err(StrategyError::InvalidWindows(self.windows));
        }
        Ok(())
    }

    /// Every instrument across both baskets, growth first, without duplicates.
    pub fn universe(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for symbol in self.growth.iter().chain(self.defensive.iter()) {
            if !out.contains(&symbol.as_str()) {
                out.push(symbol);
            }
        }
        out
    }
}

/// Which basket the rotation picked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Growth,
    Defensive,
}

/// Outcome of one ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationDecision {
    pub regime: Regime,
    /// Number of growth instruments with a negative score.
    pub negative_growth: usize,
    pub selected: Symbol,
    pub growth_ranking: Vec<RankedInstrument>,
    pub defensive_ranking: Vec<RankedInstrument>,
}

/// Apply the rotation rule to two scored baskets (in basket order).
///
/// Returns `None` if either basket is empty.
pub fn decide_rotation(
    growth: Vec<RankedInstrument>,
    defensive: Vec<RankedInstrument>,
) -> Option<RotationDecision> {
    let growth_ranking = rank_descending(growth);
    let defensive_ranking = rank_descending(defensive);

    let negative_growth = growth_ranking.iter().filter(|r| r.is_negative()).count();
    let (regime, selected) = if negative_growth > 0 {
        (Regime::Defensive, defensive_ranking.first()?.symbol.clone())
    } else {
        (Regime::Growth, growth_ranking.first()?.symbol.clone())
    };

    Some(RotationDecision {
        regime,
        negative_growth,
        selected,
        growth_ranking,
        defensive_ranking,
    })
}

/// Monthly growth/defensive rotation.
#[derive(Debug, Clone)]
pub struct DualMomentum {
    config: DualMomentumConfig,
    latch: RebalanceLatch,
    warmup: WarmupGate,
    last_decision: Option<RotationDecision>,
}

impl DualMomentum {
    pub fn new(config: DualMomentumConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            config,
            latch: RebalanceLatch::armed(),
            warmup: WarmupGate::new(1),
            last_decision: None,
        })
    }

    pub fn config(&self) -> &DualMomentumConfig {
        &self.config
    }

    pub fn latch(&self) -> RebalanceLatch {
        self.latch
    }

    /// The most recent ranking that led to a rebalance.
    pub fn last_decision(&self) -> Option<&RotationDecision> {
        self.last_decision.as_ref()
    }

    /// Score one basket in declaration order. `None` if any reading is missing.
    fn score_basket(
        &self,
        basket: &[Symbol],
        host: &dyn StrategyHost,
    ) -> Option<Vec<RankedInstrument>> {
        basket
            .iter()
            .map(|symbol| {
                let mut readings = [0.0; 4];
                for (slot, &window) in readings.iter_mut().zip(self.config.windows.iter()) {
                    *slot = host.momentum(symbol, window)?;
                }
                let score = MomentumScore::from_readings(readings);
                if !score.is_complete() {
                    return None;
                }
                Some(RankedInstrument::new(symbol.clone(), score.objective()))
            })
            .collect()
    }

    fn rotate(
        &mut self,
        data: &DataSlice,
        host: &mut dyn StrategyHost,
    ) -> Result<Option<Rebalance>, StrategyError> {
        let scored = self
            .score_basket(&self.config.growth, host)
            .zip(self.score_basket(&self.config.defensive, host));
        let Some((growth, defensive)) = scored else {
            debug!(date = %data.date, "momentum readings not ready, rebalance deferred");
            return Ok(None);
        };

        let Some(decision) = decide_rotation(growth, defensive) else {
            return Ok(None);
        };

        // Consumed before any request so a failure cannot trigger a second rotation.
        self.latch.consume();

        for ranked in &decision.growth_ranking {
            debug!(symbol = %ranked.symbol, score = ranked.score, "growth score");
        }

        host.liquidate_all()?;
        host.set_target_weight(&decision.selected, 1.0)?;
        info!(
            date = %data.date,
            regime = ?decision.regime,
            negative_growth = decision.negative_growth,
            symbol = %decision.selected,
            "rotated"
        );

        let rebalance = Rebalance {
            date: data.date,
            liquidated: true,
            targets: vec![TargetWeight {
                symbol: decision.selected.clone(),
                weight: 1.0,
            }],
        };
        self.last_decision = Some(decision);
        Ok(Some(rebalance))
    }
}

impl Strategy for DualMomentum {
    fn name(&self) -> &str {
        "dual_momentum"
    }

    fn initialize(&mut self, host: &mut dyn StrategyHost) {
        self.latch = RebalanceLatch::armed();
        self.warmup = WarmupGate::new(1);
        self.last_decision = None;

        for symbol in self.config.universe() {
            host.subscribe(Subscription::Equity(symbol.to_string()));
            for &window in &self.config.windows {
                host.register_momentum(symbol, window);
            }
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
        if !self.warmup.pass() {
            debug!(date = %data.date, "first data event skipped");
            return Ok(None);
        }
        if !self.latch.is_armed() {
            return Ok(None);
        }

        let outcome = self.rotate(data, host);
        if let Err(err) = &outcome {
            warn!(date = %data.date, error = %err, "rotation failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(pairs: &[(&str, f64)]) -> Vec<RankedInstrument> {
        pairs
            .iter()
            .map(|(s, score)| RankedInstrument::new(*s, *score))
            .collect()
    }

    #[test]
    fn any_negative_growth_selects_top_defensive() {
        let decision = decide_rotation(
            ranked(&[("SPY", -1.0), ("EFA", 2.0), ("EEM", 3.0), ("AGG", 4.0)]),
            ranked(&[("LQD", 0.5), ("IEF", 1.5), ("SHY", 0.1)]),
        )
        .unwrap();
        assert_eq!(decision.regime, Regime::Defensive);
        assert_eq!(decision.negative_growth, 1);
        assert_eq!(decision.selected, "IEF");
    }

    #[test]
    fn all_positive_growth_selects_top_growth() {
        let decision = decide_rotation(
            ranked(&[("SPY", 1.0), ("EFA", 2.0), ("EEM", 3.0), ("AGG", 4.0)]),
            ranked(&[("LQD", 9.0), ("IEF", 8.0), ("SHY", 7.0)]),
        )
        .unwrap();
        assert_eq!(decision.regime, Regime::Growth);
        assert_eq!(decision.negative_growth, 0);
        assert_eq!(decision.selected, "AGG");
    }

    #[test]
    fn zero_score_is_not_negative() {
        let decision = decide_rotation(
            ranked(&[("SPY", 0.0), ("EFA", 0.0)]),
            ranked(&[("SHY", 1.0)]),
        )
        .unwrap();
        assert_eq!(decision.regime, Regime::Growth);
        assert_eq!(decision.selected, "SPY");
    }

    #[test]
    fn defensive_pick_ignores_sign() {
        let decision = decide_rotation(
            ranked(&[("SPY", -3.0)]),
            ranked(&[("LQD", -2.0), ("IEF", -1.0), ("SHY", -5.0)]),
        )
        .unwrap();
        assert_eq!(decision.selected, "IEF");
    }

    #[test]
    fn empty_basket_yields_no_decision() {
        assert!(decide_rotation(vec![], ranked(&[("SHY", 1.0)])).is_none());
        assert!(decide_rotation(ranked(&[("SPY", -1.0)]), vec![]).is_none());
    }

    #[test]
    fn config_validation() {
        assert!(DualMomentumConfig::default().validate().is_ok());

        let cfg = DualMomentumConfig {
            defensive: vec![],
            ..Default::default()
        };
        assert_eq!(
            DualMomentum::new(cfg).unwrap_err(),
            StrategyError::EmptyBasket { basket: "defensive" }
        );

        let cfg = DualMomentumConfig {
            windows: [21, 0, 126, 252],
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(StrategyError::InvalidWindows(_))
        ));

        let cfg = DualMomentumConfig {
            windows: [21, 63, 126, usize::MAX],
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(StrategyError::InvalidWindows(_))
        ));
    }

    #[test]
    fn universe_deduplicates_across_baskets() {
        let cfg = DualMomentumConfig {
            growth: vec!["SPY".into(), "AGG".into()],
            defensive: vec!["AGG".into(), "SHY".into()],
            ..Default::default()
        };
        assert_eq!(cfg.universe(), ["SPY", "AGG", "SHY"]);
    }
}
