//! Domain types for TactLab

pub mod action;
pub mod slice;

pub use action::{HostAction, TimedAction};
pub use slice::{DataSlice, Observation};

/// Symbol type alias
pub type Symbol = String;
