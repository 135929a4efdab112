//! CAPE file loading.
//!
//! Rows that do not parse are skipped and counted, never fatal. The resulting
//! series is sorted by date with one record per date (last row wins).

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tactlab_core::cape::{cape_target_weight, CapeRecord};
use tracing::debug;

use crate::price_loader::LoadError;

/// Parsed CAPE records plus skip accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapeSeries {
    pub records: Vec<CapeRecord>,
    /// Number of non-blank rows that did not produce a record.
    pub skipped: usize,
}

impl CapeSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn first(&self) -> Option<&CapeRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&CapeRecord> {
        self.records.last()
    }

    /// Smallest and largest CAPE value in the series.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.records.iter().map(|r| r.value);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Default-bounds target weight implied by the most recent record.
    pub fn last_weight(&self) -> Option<f64> {
        self.last().map(|r| cape_target_weight(r.value))
    }

    /// BLAKE3 over the parsed records.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            hasher.update(record.date.to_string().as_bytes());
            hasher.update(&record.value.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Parse CAPE text already in memory.
pub fn parse_cape_text(text: &str) -> CapeSeries {
    let mut by_date = BTreeMap::new();
    let mut skipped = 0;

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match CapeRecord::try_parse_line(line) {
            Ok(record) => {
                by_date.insert(record.date, record);
            }
            Err(reason) => {
                skipped += 1;
                debug!(line = line_no + 1, %reason, "skipping CAPE row");
            }
        }
    }

    CapeSeries {
        records: by_date.into_values().collect(),
        skipped,
    }
}

/// Read and parse a CAPE file. A file with no usable rows is an error.
pub fn load_cape_file(path: &Path) -> Result<CapeSeries, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = parse_cape_text(&text);
    if series.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    debug!(
        path = %path.display(),
        records = series.len(),
        skipped = series.skipped,
        "loaded CAPE file"
    );
    Ok(series)
}
