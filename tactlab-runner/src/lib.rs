//! TactLab Runner: replay the strategies over historical files.
//!
//! This crate builds on `tactlab-core` to provide:
//! - TOML replay configuration
//! - CAPE file and per-symbol price loaders (with synthetic fallback)
//! - Month-end calendar derived from the data's own trading dates
//! - `ReplayHost`, a host that records requests instead of executing them
//! - Replay driver and JSON/CSV export of the resulting decision log
//!
//! Nothing here fills orders or tracks cash. A replay answers "what would the
//! strategy have asked for, and when".

pub mod calendar;
pub mod cape_loader;
pub mod config;
pub mod export;
pub mod price_loader;
pub mod replay;
pub mod replay_host;

pub use calendar::{month_end_dates, union_dates};
pub use cape_loader::{load_cape_file, parse_cape_text, CapeSeries};
pub use config::{CapeSettings, ConfigError, DualMomentumSettings, ReplayConfig};
pub use export::{
    actions_csv, import_json, load_report, report_json, save_report, summary_markdown,
};
pub use price_loader::{
    load_closes, load_prices, synthetic_closes, LoadError, LoadedPrices, PriceLoadOptions,
    PriceSeries,
};
pub use replay::{
    cape_input, price_input, replay_dual_momentum, run_cape_replay, run_dual_momentum_replay,
    run_replay, ReplayError, ReplayErrorEntry, ReplayInput, ReplayReport, SCHEMA_VERSION,
};
pub use replay_host::ReplayHost;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_is_send_sync() {
        assert_send::<ReplayReport>();
        assert_sync::<ReplayReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ReplayConfig>();
        assert_sync::<ReplayConfig>();
        assert_send::<PriceLoadOptions>();
        assert_sync::<PriceLoadOptions>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<CapeSeries>();
        assert_sync::<CapeSeries>();
        assert_send::<LoadedPrices>();
        assert_sync::<LoadedPrices>();
    }
}
