//! Rebalance latch and warm-up gate.
//!
//! Both strategies used to carry bare booleans for "a rebalance is due" and
//! "this is the first data event". These two types make the states explicit.
//!
//! The latch is single-threaded by construction (`&mut self`). If callbacks
//! ever become concurrent, `consume` must turn into an atomic swap.

use serde::{Deserialize, Serialize};

/// Two-state latch: armed by the scheduled trigger, consumed by the data callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceLatch {
    Armed,
    Consumed,
}

impl RebalanceLatch {
    /// Both strategies start armed: the first eligible data event rebalances
    /// without waiting for the first month-end.
    pub fn armed() -> Self {
        RebalanceLatch::Armed
    }

    pub fn consumed() -> Self {
        RebalanceLatch::Consumed
    }

    pub fn arm(&mut self) {
        *self = RebalanceLatch::Armed;
    }

    /// Returns `true` exactly once per arming and leaves the latch consumed.
    pub fn consume(&mut self) -> bool {
        std::mem::replace(self, RebalanceLatch::Consumed) == RebalanceLatch::Armed
    }

    pub fn is_armed(&self) -> bool {
        *self == RebalanceLatch::Armed
    }
}

impl Default for RebalanceLatch {
    fn default() -> Self {
        Self::armed()
    }
}

/// Blocks the first `skip` events, then lets everything through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupGate {
    remaining: usize,
}

impl WarmupGate {
    pub fn new(skip: usize) -> Self {
        Self { remaining: skip }
    }

    /// Record one event. Returns `false` while the gate is still closed.
    pub fn pass(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }

    pub fn is_open(&self) -> bool {
        self.remaining == 0
    }
}
