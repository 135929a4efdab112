//! CAPE custom data: line parsing and the CAPE weight rule.
//!
//! The source file is plain comma-delimited text, one row per date:
//! field 0 is an ISO date, field 16 is the CAPE ratio. Header rows, notes
//! and anything else that does not start with a digit are not records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column holding the CAPE ratio.
pub const CAPE_FIELD_INDEX: usize = 16;

/// Date format of column 0.
pub const CAPE_DATE_FORMAT: &str = "%Y-%m-%d";

/// One CAPE observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapeRecord {
    pub date: NaiveDate,
    pub value: f64,
}

/// Why a line did not produce a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapeParseError {
    #[error("blank line")]
    Blank,

    #[error("line does not start with a digit")]
    NotARecord,

    #[error("expected at least {expected} fields, found {found}")]
    MissingField { expected: usize, found: usize },

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("invalid CAPE value '{0}'")]
    InvalidValue(String),
}

impl CapeRecord {
    /// Parse one line, reporting why it was rejected.
    pub fn try_parse_line(line: &str) -> Result<Self, CapeParseError> {
        if line.trim().is_empty() {
            return Err(CapeParseError::Blank);
        }
        // Leading whitespace disqualifies the row as well.
        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(CapeParseError::NotARecord);
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() <= CAPE_FIELD_INDEX {
            return Err(CapeParseError::MissingField {
                expected: CAPE_FIELD_INDEX + 1,
                found: fields.len(),
            });
        }

        let raw_date = fields[0].trim();
        let date = NaiveDate::parse_from_str(raw_date, CAPE_DATE_FORMAT)
            .map_err(|_| CapeParseError::InvalidDate(raw_date.to_string()))?;

        let raw_value = fields[CAPE_FIELD_INDEX].trim();
        let value: f64 = raw_value
            .parse()
            .map_err(|_| CapeParseError::InvalidValue(raw_value.to_string()))?;
        if !value.is_finite() {
            return Err(CapeParseError::InvalidValue(raw_value.to_string()));
        }

        Ok(Self { date, value })
    }

    /// Parse one line; malformed rows yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        Self::try_parse_line(line).ok()
    }
}

/// Clamp bounds for the CAPE-derived target weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub lower: f64,
    pub upper: f64,
}

impl WeightBounds {
    pub const DEFAULT_LOWER: f64 = 0.5;
    pub const DEFAULT_UPPER: f64 = 1.5;

    pub fn new(lower: f64, upper: f64) -> Self {
        debug_assert!(lower <= upper, "lower bound must not exceed upper bound");
        Self { lower, upper }
    }

    /// `clamp(1 - cape, lower, upper)`.
    pub fn weight_for(&self, cape: f64) -> f64 {
        (1.0 - cape).max(self.lower).min(self.upper)
    }
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOWER, Self::DEFAULT_UPPER)
    }
}

/// Target weight for a CAPE value under the default bounds.
pub fn cape_target_weight(cape: f64) -> f64 {
    WeightBounds::default().weight_for(cape)
}
