//! Line Collectors
//!
//! A collector owns the process-wide line counters. The engine only pulls
//! snapshots from it and asks it to clear; it never stops it.

mod lcov;
mod memory;

pub use lcov::{parse_tracefile, LcovCollector, LcovRecord, MAX_LCOV_LINE};
pub use memory::InMemoryCollector;

use crate::result::HeatlineResult;
use crate::snapshot::RawSnapshot;

/// Source of cumulative per-line hit counts
pub trait LineCollector: Send + Sync + std::fmt::Debug {
    /// Begin counting. Collectors that are always on can keep the default.
    fn start(&self) -> HeatlineResult<()> {
        Ok(())
    }

    /// Current cumulative counts since the last clear
    ///
    /// Must not reset the counters.
    fn peek(&self) -> HeatlineResult<RawSnapshot>;

    /// Reset every hit count to zero
    fn clear(&self) -> HeatlineResult<()>;
}
