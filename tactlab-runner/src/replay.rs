//! Replay driver: walks dated events through a strategy and a `ReplayHost`.
//!
//! For every event date, in order:
//! 1. if the date is a month-end of the reference calendar, fire
//!    `on_schedule_trigger` (month-end, after the open)
//! 2. deliver the date's `DataSlice` to `on_data`
//!
//! Strategy errors are logged by the strategy and counted in the report.
//! They never abort the replay.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tactlab_core::domain::{DataSlice, Observation, TimedAction};
use tactlab_core::strategy::{
    CapeStrategy, CapeStrategyConfig, DualMomentum, DualMomentumConfig, Rebalance, Strategy,
    StrategyError,
};
use thiserror::Error;
use tracing::info;

use crate::calendar::{month_end_dates, union_dates};
use crate::cape_loader::CapeSeries;
use crate::price_loader::{load_prices, LoadError, LoadedPrices, PriceLoadOptions};
use crate::replay_host::ReplayHost;

/// Current report schema version. Reports with a newer version are rejected on import.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("no data events in the selected range")]
    NoEvents,

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// A strategy error raised during replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayErrorEntry {
    pub date: NaiveDate,
    pub message: String,
}

/// Decision log of one replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub schema_version: u32,
    pub strategy: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub data_events: usize,
    pub triggers: usize,
    pub rebalances: Vec<Rebalance>,
    pub errors: Vec<ReplayErrorEntry>,
    pub dataset_hash: String,
    /// True if any input was synthetic.
    pub synthetic: bool,
    pub actions: Vec<TimedAction>,
}

/// Events and calendar for one replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayInput {
    pub slices: Vec<DataSlice>,
    pub month_ends: BTreeSet<NaiveDate>,
    pub dataset_hash: String,
    pub synthetic: bool,
}

/// Drive `strategy` through `input` against `host`.
pub fn run_replay(
    strategy: &mut dyn Strategy,
    host: &mut ReplayHost,
    input: ReplayInput,
) -> Result<ReplayReport, ReplayError> {
    let (start, end) = match (input.slices.first(), input.slices.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Err(ReplayError::NoEvents),
    };

    strategy.initialize(host);

    let mut triggers = 0;
    let mut rebalances = Vec::new();
    let mut errors = Vec::new();

    for slice in &input.slices {
        host.set_today(slice.date);
        if input.month_ends.contains(&slice.date) {
            strategy.on_schedule_trigger(host);
            triggers += 1;
        }
        match strategy.on_data(slice, host) {
            Ok(Some(rebalance)) => rebalances.push(rebalance),
            Ok(None) => {}
            Err(e) => errors.push(ReplayErrorEntry {
                date: slice.date,
                message: e.to_string(),
            }),
        }
    }

    info!(
        strategy = strategy.name(),
        %start,
        %end,
        events = input.slices.len(),
        triggers,
        rebalances = rebalances.len(),
        errors = errors.len(),
        "replay complete"
    );

    Ok(ReplayReport {
        schema_version: SCHEMA_VERSION,
        strategy: strategy.name().to_string(),
        start,
        end,
        data_events: input.slices.len(),
        triggers,
        rebalances,
        errors,
        dataset_hash: input.dataset_hash,
        synthetic: input.synthetic,
        actions: host.actions().to_vec(),
    })
}

/// One event per CAPE record; the CAPE dates are also the calendar.
pub fn cape_input(series: &CapeSeries, dataset: &str) -> ReplayInput {
    let slices = series
        .records
        .iter()
        .map(|record| DataSlice::new(record.date).with(dataset, Observation::Cape(*record)))
        .collect();
    ReplayInput {
        slices,
        month_ends: month_end_dates(&series.dates()),
        dataset_hash: series.dataset_hash(),
        synthetic: false,
    }
}

/// Replay the CAPE strategy over a loaded CAPE series.
pub fn run_cape_replay(
    config: &CapeStrategyConfig,
    series: &CapeSeries,
) -> Result<ReplayReport, ReplayError> {
    let mut strategy = CapeStrategy::new(config.clone());
    let mut host = ReplayHost::default();
    run_replay(&mut strategy, &mut host, cape_input(series, &config.dataset))
}

/// One event per date in the union of all loaded closes, restricted to
/// `[start, end]`. Month-ends come from `reference` when it is loaded.
pub fn price_input(
    prices: &LoadedPrices,
    reference: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ReplayInput {
    let in_range =
        |d: &NaiveDate| start.map_or(true, |s| *d >= s) && end.map_or(true, |e| *d <= e);

    let all_dates = union_dates(prices.series.values().map(|s| s.dates.as_slice()));
    let calendar: Vec<NaiveDate> = match prices.series.get(reference) {
        Some(series) => series.dates.clone(),
        None => all_dates.clone(),
    };
    let month_ends = month_end_dates(&calendar)
        .into_iter()
        .filter(|d| in_range(d))
        .collect();

    let by_symbol: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = prices
        .series
        .iter()
        .map(|(symbol, s)| {
            let closes = s.dates.iter().copied().zip(s.closes.iter().copied()).collect();
            (symbol.as_str(), closes)
        })
        .collect();

    let slices = all_dates
        .into_iter()
        .filter(|d| in_range(d))
        .map(|date| {
            let mut slice = DataSlice::new(date);
            for (symbol, closes) in &by_symbol {
                if let Some(&close) = closes.get(&date) {
                    slice.insert(*symbol, Observation::Price { close });
                }
            }
            slice
        })
        .collect();

    ReplayInput {
        slices,
        month_ends,
        dataset_hash: prices.dataset_hash.clone(),
        synthetic: prices.has_synthetic(),
    }
}

/// Replay dual momentum over closes that are already loaded.
///
/// Closes before `start` still feed the momentum indicators.
pub fn replay_dual_momentum(
    config: &DualMomentumConfig,
    prices: &LoadedPrices,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ReplayReport, ReplayError> {
    let mut strategy = DualMomentum::new(config.clone())?;
    let mut host = ReplayHost::new(prices.series.clone());
    let input = price_input(prices, &config.reference, start, end);
    run_replay(&mut strategy, &mut host, input)
}

/// Calendar days of history loaded ahead of `start` so the longest window is warm.
pub fn warmup_days(config: &DualMomentumConfig) -> i64 {
    let longest = config.windows.iter().copied().max().unwrap_or(0) as i64;
    longest * 7 / 5 + 14
}

/// Load closes for the whole universe and replay dual momentum.
pub fn run_dual_momentum_replay(
    config: &DualMomentumConfig,
    opts: &PriceLoadOptions,
) -> Result<ReplayReport, ReplayError> {
    config.validate()?;
    let load_opts = PriceLoadOptions {
        start: opts.start.map(|s| {
            s.checked_sub_signed(Duration::days(warmup_days(config)))
                .unwrap_or(NaiveDate::MIN)
        }),
        ..opts.clone()
    };
    let mut symbols = config.universe();
    if !symbols.contains(&config.reference.as_str()) {
        symbols.push(&config.reference);
    }
    let prices = load_prices(&symbols, &load_opts)?;
    replay_dual_momentum(config, &prices, opts.start, opts.end)
}
