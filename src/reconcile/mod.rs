//! Periodic reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! Ticker (fixed interval grid)
//!     → scheduler.rs (one check in flight, missed ticks dropped)
//!     → ConsistencyCheck::check(None)
//!     → outcome logged + counted, loop continues
//! ```
//!
//! # Design Decisions
//! - Entered only after a successful bootstrap
//! - A zero interval means no reconciliation at all
//! - Failures never stop the loop and never touch the setup handler

pub mod scheduler;

use std::time::Duration;

pub use scheduler::{ReconcileSummary, Reconciler, ReconcilerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub interval: Duration,
}

impl ReconcilerConfig {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }
}
