//! Rate of Change (momentum percent).
//!
//! Percentage price change over N bars.
//! ROC[t] = (close[t] - close[t-period]) / close[t-period] * 100
//! Lookback: period.
//!
//! This is the reading the dual-momentum score consumes for its 21/63/126/252
//! day windows.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let prev = closes[i - self.period];
            let curr = closes[i];
            if prev.is_nan() || curr.is_nan() || prev == 0.0 {
                result[i] = f64::NAN;
            } else {
                result[i] = (curr - prev) / prev * 100.0;
            }
        }

        result
    }
}
