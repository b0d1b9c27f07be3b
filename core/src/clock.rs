//! Time and block sources
//!
//! The engines never read the wall clock directly; they are handed a
//! [`Clock`] so that a host ledger, a simulation, or a test can drive time.

use crate::{BlockNumber, Timestamp};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

/// Source of the current timestamp and block height
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
    fn block_number(&self) -> BlockNumber;
}

/// Wall-clock time with blocks derived from a fixed block interval
#[derive(Debug, Clone)]
pub struct SystemClock {
    genesis_time: Timestamp,
    block_interval: u64,
}

impl SystemClock {
    pub fn new(genesis_time: Timestamp, block_interval: u64) -> Self {
        Self {
            genesis_time,
            block_interval: block_interval.max(1),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp().max(0) as Timestamp
    }

    fn block_number(&self) -> BlockNumber {
        self.now().saturating_sub(self.genesis_time) / self.block_interval
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ClockState {
    time: Timestamp,
    block: BlockNumber,
}

/// Manually driven clock shared between every component of a simulation.
///
/// Cloning yields another handle onto the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<RwLock<ClockState>>,
}

impl ManualClock {
    pub fn new(time: Timestamp, block: BlockNumber) -> Self {
        Self {
            state: Arc::new(RwLock::new(ClockState { time, block })),
        }
    }

    pub fn set_time(&self, time: Timestamp) {
        self.state.write().time = time;
    }

    pub fn advance_time(&self, secs: u64) {
        let mut state = self.state.write();
        state.time = state.time.saturating_add(secs);
    }

    pub fn advance_blocks(&self, blocks: u64) {
        let mut state = self.state.write();
        state.block = state.block.saturating_add(blocks);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.state.read().time
    }

    fn block_number(&self) -> BlockNumber {
        self.state.read().block
    }
}
