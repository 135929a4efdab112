//! Indicator trait, precomputed value container, and the momentum-percent indicator.
//!
//! Hosts compute indicators; strategies only read them. This module is what a
//! host uses to do that: indicators are pure functions over a close series,
//! precomputed once and then queried by bar index.

pub mod roc;

pub use roc::Roc;

use std::collections::HashMap;

/// Trait for indicators over a daily close series.
///
/// Output has the same length as the input. The first `lookback()` values
/// are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No value at index t may depend on closes after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "roc_21").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// Container for precomputed indicator values.
///
/// Built once before replay, then queried by bar index.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
