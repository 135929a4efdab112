//! TactLab Core: tactical allocation strategies and the host contract they run against.
//!
//! This crate contains the decision logic only:
//! - Domain types (data slices, observations, host actions)
//! - The `StrategyHost` trait: everything a strategy may ask of its host
//! - Rebalance latch and warm-up gate
//! - Momentum-percent indicator and the 13612W momentum score
//! - CAPE custom-data parsing and the CAPE weight rule
//! - Two strategies: CAPE allocation and dual-momentum rotation
//!
//! There is no engine here. Order generation, fills and portfolio accounting
//! belong to whatever implements `StrategyHost`.

pub mod cape;
pub mod domain;
pub mod host;
pub mod indicators;
pub mod latch;
pub mod score;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: strategies and their state can move to a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::DataSlice>();
        require_sync::<domain::DataSlice>();
        require_send::<domain::HostAction>();
        require_sync::<domain::HostAction>();
        require_send::<cape::CapeRecord>();
        require_sync::<cape::CapeRecord>();
        require_send::<latch::RebalanceLatch>();
        require_sync::<latch::RebalanceLatch>();
        require_send::<score::MomentumScore>();
        require_sync::<score::MomentumScore>();
        require_send::<indicators::IndicatorValues>();
        require_sync::<indicators::IndicatorValues>();

        require_send::<strategy::CapeStrategy>();
        require_send::<strategy::DualMomentum>();
        require_send::<Box<dyn strategy::Strategy>>();
    }

    /// Architecture contract: strategies reach the outside world only through the host.
    ///
    /// `on_data` takes the slice and `&mut dyn StrategyHost`; there is no
    /// portfolio or broker parameter. If this stops compiling, the contract moved.
    #[test]
    fn strategy_trait_only_sees_slice_and_host() {
        fn _check_trait_object_builds(
            s: &mut dyn strategy::Strategy,
            data: &domain::DataSlice,
            host: &mut dyn host::StrategyHost,
        ) -> Result<Option<strategy::Rebalance>, strategy::StrategyError> {
            s.on_data(data, host)
        }
    }
}
