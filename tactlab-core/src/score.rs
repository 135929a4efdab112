//! 13612W momentum score and basket ranking.
//!
//! score = 12 × m1 + 4 × m3 + 2 × m6 + 1 × m12
//!
//! where m1..m12 are momentum-percent readings over 21/63/126/252 trading
//! days. The front month dominates; older windows are progressively
//! underweighted.

use serde::{Deserialize, Serialize};

use crate::domain::Symbol;

/// Trading-day windows for the 1, 3, 6 and 12 month readings.
pub const MOMENTUM_WINDOWS: [usize; 4] = [21, 63, 126, 252];

/// Longest accepted momentum window (about 40 years of trading days).
pub const MAX_MOMENTUM_WINDOW: usize = 10_000;

/// Coefficients applied to the 1, 3, 6 and 12 month readings.
pub const SCORE_WEIGHTS: [f64; 4] = [12.0, 4.0, 2.0, 1.0];

/// Four momentum readings for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumScore {
    pub one_month: f64,
    pub three_month: f64,
    pub six_month: f64,
    pub twelve_month: f64,
}

impl MomentumScore {
    pub fn new(one_month: f64, three_month: f64, six_month: f64, twelve_month: f64) -> Self {
        Self {
            one_month,
            three_month,
            six_month,
            twelve_month,
        }
    }

    /// Readings in window order (1, 3, 6, 12 months).
    pub fn from_readings(readings: [f64; 4]) -> Self {
        Self::new(readings[0], readings[1], readings[2], readings[3])
    }

    pub fn readings(&self) -> [f64; 4] {
        [
            self.one_month,
            self.three_month,
            self.six_month,
            self.twelve_month,
        ]
    }

    /// Weighted scalar score.
    pub fn objective(&self) -> f64 {
        self.readings()
            .iter()
            .zip(SCORE_WEIGHTS.iter())
            .map(|(reading, weight)| reading * weight)
            .sum()
    }

    /// True when every reading is a finite number.
    pub fn is_complete(&self) -> bool {
        self.readings().iter().all(|r| r.is_finite())
    }
}

/// One instrument with its score, as placed in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedInstrument {
    pub symbol: Symbol,
    pub score: f64,
}

impl RankedInstrument {
    pub fn new(symbol: impl Into<Symbol>, score: f64) -> Self {
        Self {
            symbol: symbol.into(),
            score,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.score < 0.0
    }
}

/// Sort instruments by descending score.
///
/// The sort is stable: equal scores keep their input (basket) order.
pub fn rank_descending(mut instruments: Vec<RankedInstrument>) -> Vec<RankedInstrument> {
    instruments.sort_by(|a, b| b.score.total_cmp(&a.score));
    instruments
}
