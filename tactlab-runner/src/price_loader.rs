//! Daily close loading for the replay host.
//!
//! Each symbol lives in `<dir>/<SYMBOL>.csv` with at least `date` and `close`
//! columns. Fallback policy per symbol:
//! 1. If the file exists → load it
//! 2. If not and `synthetic` is set → generate a tagged random walk
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only mode. Reports built on it carry the
//! `synthetic` flag.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the data loading layer (prices and CAPE files).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no price file for '{symbol}' (expected {path}; use --synthetic for synthetic data)")]
    NoData { symbol: String, path: PathBuf },

    #[error("invalid close {close} for '{symbol}' on {date}")]
    InvalidClose {
        symbol: String,
        date: NaiveDate,
        close: f64,
    },

    #[error("no usable records in {0}")]
    Empty(PathBuf),
}

/// Dated close series for one symbol, sorted ascending with unique dates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    /// Build from unsorted rows. Later rows win on duplicate dates.
    pub fn from_rows(
        symbol: impl Into<String>,
        rows: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        let by_date: BTreeMap<NaiveDate, f64> = rows.into_iter().collect();
        let (dates, closes) = by_date.into_iter().unzip();
        Self {
            symbol: symbol.into(),
            dates,
            closes,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Index of the last bar dated on or before `date`.
    pub fn index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        self.dates.partition_point(|d| *d <= date).checked_sub(1)
    }

    /// Keep only bars inside `[start, end]` (either bound optional).
    pub fn restrict(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        let keep = |d: &NaiveDate| start.map_or(true, |s| *d >= s) && end.map_or(true, |e| *d <= e);
        let (dates, closes): (Vec<_>, Vec<_>) = self
            .dates
            .iter()
            .zip(self.closes.iter())
            .filter(|(d, _)| keep(d))
            .map(|(d, c)| (*d, *c))
            .unzip();
        self.dates = dates;
        self.closes = closes;
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    close: f64,
}

/// Load one symbol's `date,close` CSV (header required, extra columns ignored).
pub fn load_closes(path: &Path, symbol: &str) -> Result<PriceSeries, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows = Vec::new();
    for row in reader.deserialize::<PriceRow>() {
        let row = row.map_err(csv_err)?;
        if !row.close.is_finite() || row.close <= 0.0 {
            return Err(LoadError::InvalidClose {
                symbol: symbol.to_string(),
                date: row.date,
                close: row.close,
            });
        }
        rows.push((row.date, row.close));
    }

    let series = PriceSeries::from_rows(symbol, rows);
    if series.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    debug!(symbol, bars = series.len(), path = %path.display(), "loaded closes");
    Ok(series)
}

/// Options controlling how closes are loaded.
#[derive(Debug, Clone, Default)]
pub struct PriceLoadOptions {
    /// Directory holding `<SYMBOL>.csv` files.
    pub dir: Option<PathBuf>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Generate synthetic closes for symbols without a file.
    pub synthetic: bool,
}

/// Closes for a set of symbols, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub series: BTreeMap<String, PriceSeries>,
    /// Symbols whose data is synthetic.
    pub synthetic_symbols: Vec<String>,
    /// BLAKE3 over all loaded closes, in sorted symbol order.
    pub dataset_hash: String,
}

impl LoadedPrices {
    pub fn has_synthetic(&self) -> bool {
        !self.synthetic_symbols.is_empty()
    }
}

/// Start of the synthetic span when no start date is given.
pub const DEFAULT_SYNTHETIC_START: (i32, u32, u32) = (2004, 1, 2);

/// Length of the synthetic span when no end date is given.
const DEFAULT_SYNTHETIC_DAYS: i64 = 365 * 6;

/// Load closes for every symbol, falling back to synthetic data when allowed.
pub fn load_prices(symbols: &[&str], opts: &PriceLoadOptions) -> Result<LoadedPrices, LoadError> {
    let mut series = BTreeMap::new();
    let mut synthetic_symbols = Vec::new();

    for &symbol in symbols {
        if series.contains_key(symbol) {
            continue;
        }
        let path = opts
            .dir
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{symbol}.csv"));

        if opts.dir.is_some() && path.is_file() {
            let mut loaded = load_closes(&path, symbol)?;
            loaded.restrict(opts.start, opts.end);
            if loaded.is_empty() {
                return Err(LoadError::Empty(path));
            }
            series.insert(symbol.to_string(), loaded);
            continue;
        }

        if opts.synthetic {
            warn!(symbol, "generating synthetic closes; results will be tagged as synthetic");
            let start = opts.start.unwrap_or_else(default_synthetic_start);
            let end = opts
                .end
                .unwrap_or(start + Duration::days(DEFAULT_SYNTHETIC_DAYS));
            series.insert(symbol.to_string(), synthetic_closes(symbol, start, end));
            synthetic_symbols.push(symbol.to_string());
            continue;
        }

        return Err(LoadError::NoData {
            symbol: symbol.to_string(),
            path,
        });
    }

    let dataset_hash = compute_dataset_hash(&series);
    Ok(LoadedPrices {
        series,
        synthetic_symbols,
        dataset_hash,
    })
}

fn default_synthetic_start() -> NaiveDate {
    let (y, m, d) = DEFAULT_SYNTHETIC_START;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Deterministic BLAKE3 hash over dates and closes in sorted symbol order.
fn compute_dataset_hash(series: &BTreeMap<String, PriceSeries>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (symbol, s) in series {
        hasher.update(symbol.as_bytes());
        for (date, close) in s.dates.iter().zip(s.closes.iter()) {
            hasher.update(date.to_string().as_bytes());
            hasher.update(&close.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a synthetic close series (weekdays only).
///
/// A simple random walk from 100.0 with a deterministic seed derived from the
/// symbol, so repeated runs see identical data.
pub fn synthetic_closes(symbol: &str, start: NaiveDate, end: NaiveDate) -> PriceSeries {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut rows = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let daily_return: f64 = rng.gen_range(-0.02..0.02);
            price *= 1.0 + daily_return;
            rows.push((current, price));
        }
        current += Duration::days(1);
    }

    PriceSeries::from_rows(symbol, rows)
}
