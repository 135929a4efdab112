//! Serializable replay configuration.
//!
//! A replay config is a TOML file with optional `[cape]` and
//! `[dual_momentum]` tables. Every field has a default matching the reference
//! strategies, so an empty file is a valid config.
//!
//! ```toml
//! [cape]
//! cape_file = "data/cape_data.csv"
//! symbols = ["SPX"]
//! bounds = { lower = 0.5, upper = 1.5 }
//!
//! [dual_momentum]
//! prices_dir = "data/prices"
//! growth = ["SPY", "EFA", "EEM", "AGG"]
//! defensive = ["LQD", "IEF", "SHY"]
//! windows = [21, 63, 126, 252]
//! start = "2004-01-01"
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tactlab_core::strategy::{CapeStrategyConfig, DualMomentumConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level replay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub cape: CapeSettings,
    pub dual_momentum: DualMomentumSettings,
}

/// `[cape]` table: strategy parameters plus the CAPE source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapeSettings {
    pub cape_file: Option<PathBuf>,
    #[serde(flatten)]
    pub strategy: CapeStrategyConfig,
}

/// `[dual_momentum]` table: strategy parameters plus price inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualMomentumSettings {
    /// Directory holding `<SYMBOL>.csv` files with `date,close` columns.
    pub prices_dir: Option<PathBuf>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Fall back to a synthetic random walk for symbols without a file.
    pub synthetic: bool,
    #[serde(flatten)]
    pub strategy: DualMomentumConfig,
}

impl ReplayConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ReplayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cape = &self.cape.strategy;
        if cape.symbols.is_empty() {
            return Err(ConfigError::Invalid("cape.symbols must not be empty".into()));
        }
        let bounds = cape.bounds;
        if bounds.lower.is_nan() || bounds.upper.is_nan() || bounds.lower > bounds.upper {
            return Err(ConfigError::Invalid(format!(
                "cape.bounds.lower ({}) must not exceed cape.bounds.upper ({})",
                bounds.lower, bounds.upper
            )));
        }

        self.dual_momentum
            .strategy
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("dual_momentum: {e}")))?;

        if let (Some(start), Some(end)) = (self.dual_momentum.start, self.dual_momentum.end) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "dual_momentum.start ({start}) is after dual_momentum.end ({end})"
                )));
            }
        }
        Ok(())
    }
}
