//! Heatline: live line-coverage aggregation for running programs
//!
//! Samples cumulative per-line hit counts from a collector, spreads the
//! count of multi-line calls across every line they occupy, buckets
//! counts into heat tiers for display and streams incremental deltas to a
//! file at a fixed interval.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  peek   ┌────────────────┐        ┌──────────────┐
//! │ LineCollector│────────►│ SnapshotFilter │───────►│ DiffEmitter  │──► coverage.json
//! └──────────────┘         └───────┬────────┘        └──────────────┘
//!                                  │ ProjectSnapshot
//!                  ┌───────────────┼───────────────┐
//!                  ▼               ▼               ▼
//!          ┌─────────────┐  ┌─────────────┐  ┌────────────┐
//!          │ CallScanner │─►│ attribute() │─►│ heat tiers │──► viewer
//!          └─────────────┘  └─────────────┘  └────────────┘
//! ```
//!
//! Exported deltas carry raw counts; attribution is a display concern.
//!
//! # Example
//!
//! ```no_run
//! use heatline::{CoverageEngine, EmitConfig, HeatlineConfig, LcovCollector};
//! use std::sync::Arc;
//!
//! # async fn run() -> heatline::HeatlineResult<()> {
//! let config = HeatlineConfig::new("/srv/app").with_exclude(["vendor/**/*.rs"]);
//! let engine = CoverageEngine::from_config(&config, Arc::new(LcovCollector::new("lcov.info")))?;
//!
//! let snapshot = engine.snapshot()?;
//! let summary = engine.summary(&snapshot);
//! println!("hottest file: {:?}", summary.file_with_max_total);
//!
//! let emitter = engine.emitter(EmitConfig::new("/tmp/heatline/coverage.json"))?.spawn();
//! emitter.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Line attribution over multi-line calls
pub mod attribution;
/// Line collectors
pub mod collector;
mod config;
/// Periodic delta export
pub mod emitter;
mod engine;
/// Heat tiers and project summaries
pub mod heat;
mod result;
/// Multi-line call scanning
pub mod scan;
mod snapshot;

pub use attribution::{attribute, AttributedLines};
pub use collector::{InMemoryCollector, LcovCollector, LineCollector};
pub use config::{EmitConfig, HeatlineConfig, DEFAULT_INTERVAL_MS};
pub use emitter::{Delta, DeltaKind, DiffEmitter, EmittedPayload, EmitterHandle};
pub use engine::{Attribution, CoverageEngine, FileReport};
pub use heat::{file_heats, line_heats, summarize, tier, FileHeat, LineHeat, Summary, TOP_TIER};
pub use result::{HeatlineError, HeatlineResult};
pub use scan::{CallRange, CallScanner, RustCallScanner};
pub use snapshot::{
    filter, total_hits, ExclusionSet, LineRecord, ProjectSnapshot, RawSnapshot, SnapshotFilter,
};
