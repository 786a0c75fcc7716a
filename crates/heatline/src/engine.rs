//! Coverage Engine
//!
//! Query interface used by the presentation layer: project snapshots,
//! summaries, attributed lines and reset. Holds the injected collector
//! and scanner plus the baseline it shares with its emitters.

use crate::attribution::{attribute, AttributedLines};
use crate::collector::LineCollector;
use crate::config::{EmitConfig, HeatlineConfig};
use crate::emitter::{lock_baseline, Baseline, DiffEmitter};
use crate::heat::{line_heats, summarize, LineHeat, Summary};
use crate::result::{HeatlineError, HeatlineResult};
use crate::scan::{CallScanner, RustCallScanner};
use crate::snapshot::{LineRecord, ProjectSnapshot, SnapshotFilter};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Whether call ranges were applied to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Attribution {
    /// The file was scanned; `ranges` multi-line calls were found
    Applied {
        /// Number of call ranges applied
        ranges: usize,
    },
    /// Scanning failed; counts are raw
    Unavailable {
        /// Scanner error
        reason: String,
    },
}

/// What the viewer should show for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileReport {
    /// Attributed, tiered lines
    Lines {
        /// Project-relative path
        path: String,
        /// One row per source line
        lines: Vec<LineHeat>,
        /// Attribution status
        attribution: Attribution,
    },
    /// The file has no coverage entry
    NoCoverage {
        /// Requested path
        path: String,
    },
    /// The file has coverage but is gone from disk
    Missing {
        /// Requested path
        path: String,
    },
    /// Nothing was requested and the snapshot is empty
    NothingCollected,
}

impl FileReport {
    /// Explanatory message for reports without lines
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Lines { .. } => None,
            Self::NoCoverage { path } => {
                Some(HeatlineError::EmptyResult { path: path.clone() }.to_string())
            }
            Self::Missing { path } => {
                Some(HeatlineError::FileNotFound { path: path.clone() }.to_string())
            }
            Self::NothingCollected => Some("No coverage has been collected yet".to_string()),
        }
    }

    /// Path the report is about
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Lines { path, .. } | Self::NoCoverage { path } | Self::Missing { path } => {
                Some(path)
            }
            Self::NothingCollected => None,
        }
    }
}

/// Line-coverage engine
#[derive(Debug, Clone)]
pub struct CoverageEngine {
    collector: Arc<dyn LineCollector>,
    scanner: Arc<dyn CallScanner>,
    filter: Arc<SnapshotFilter>,
    baseline: Arc<Mutex<Baseline>>,
}

impl CoverageEngine {
    /// Create an engine with the Rust call scanner
    #[must_use]
    pub fn new(collector: Arc<dyn LineCollector>, filter: SnapshotFilter) -> Self {
        Self {
            collector,
            scanner: Arc::new(RustCallScanner::new()),
            filter: Arc::new(filter),
            baseline: Arc::default(),
        }
    }

    /// Create an engine from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn from_config(
        config: &HeatlineConfig,
        collector: Arc<dyn LineCollector>,
    ) -> HeatlineResult<Self> {
        config.validate()?;
        let filter = config.snapshot_filter()?;
        debug!(
            root = filter.project_root(),
            excluded = filter.exclusions().len(),
            "Coverage engine configured"
        );
        Ok(Self::new(collector, filter))
    }

    /// Replace the call scanner
    #[must_use]
    pub fn with_scanner(mut self, scanner: Arc<dyn CallScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Normalized project root
    #[must_use]
    pub fn project_root(&self) -> &str {
        self.filter.project_root()
    }

    /// Start the collector
    ///
    /// # Errors
    ///
    /// Returns error if the collector cannot start
    pub fn start(&self) -> HeatlineResult<()> {
        self.collector.start()?;
        info!(root = self.project_root(), "Coverage collection started");
        Ok(())
    }

    /// Current project snapshot
    ///
    /// # Errors
    ///
    /// Returns error if the collector cannot produce a snapshot
    pub fn snapshot(&self) -> HeatlineResult<ProjectSnapshot> {
        Ok(self.filter.apply(self.collector.peek()?))
    }

    /// Project summary of a snapshot
    #[must_use]
    pub fn summary(&self, snapshot: &ProjectSnapshot) -> Summary {
        summarize(snapshot)
    }

    /// Attributed lines of one project file
    ///
    /// A scan failure falls back to raw counts for this file.
    ///
    /// # Errors
    ///
    /// Returns [`HeatlineError::EmptyResult`] if the file has no coverage
    /// entry and [`HeatlineError::FileNotFound`] if it is gone from disk
    pub fn attributed_lines(
        &self,
        path: &str,
        snapshot: &ProjectSnapshot,
    ) -> HeatlineResult<AttributedLines> {
        self.attribute_file(path, snapshot).map(|(lines, _)| lines)
    }

    /// Report for the viewer
    ///
    /// `path` defaults to the file with the largest total.
    #[must_use]
    pub fn file_report(
        &self,
        path: Option<&str>,
        snapshot: &ProjectSnapshot,
        summary: &Summary,
    ) -> FileReport {
        let Some(path) = path
            .map(str::to_string)
            .or_else(|| summary.file_with_max_total.clone())
        else {
            return FileReport::NothingCollected;
        };
        match self.attribute_file(&path, snapshot) {
            Ok((lines, attribution)) => FileReport::Lines {
                lines: line_heats(&lines),
                path,
                attribution,
            },
            Err(HeatlineError::FileNotFound { .. }) => FileReport::Missing { path },
            Err(_) => FileReport::NoCoverage { path },
        }
    }

    /// Zero the collector and forget the emitter baseline
    ///
    /// # Errors
    ///
    /// Returns error if the baseline lock is poisoned or the collector
    /// cannot clear
    pub fn reset(&self) -> HeatlineResult<()> {
        let mut baseline = lock_baseline(&self.baseline)?;
        self.collector.clear()?;
        baseline.clear();
        info!("Coverage counters reset");
        Ok(())
    }

    /// Create a diff emitter sharing this engine's baseline
    ///
    /// # Errors
    ///
    /// Returns error if the settings are invalid or the output directory
    /// cannot be created
    pub fn emitter(&self, config: EmitConfig) -> HeatlineResult<DiffEmitter> {
        DiffEmitter::new(
            Arc::clone(&self.collector),
            Arc::clone(&self.filter),
            Arc::clone(&self.baseline),
            config,
        )
    }

    fn source_path(&self, path: &str) -> PathBuf {
        PathBuf::from(format!("{}{path}", self.filter.project_root()))
    }

    fn attribute_file(
        &self,
        path: &str,
        snapshot: &ProjectSnapshot,
    ) -> HeatlineResult<(AttributedLines, Attribution)> {
        let lines = snapshot.get(path).ok_or_else(|| HeatlineError::EmptyResult {
            path: path.to_string(),
        })?;
        let source = self.source_path(path);
        if !source.is_file() {
            return Err(HeatlineError::FileNotFound {
                path: path.to_string(),
            });
        }
        Ok(self.attribute_or_raw(path, lines, &source))
    }

    fn attribute_or_raw(
        &self,
        path: &str,
        lines: &[LineRecord],
        source: &std::path::Path,
    ) -> (AttributedLines, Attribution) {
        match self.scanner.scan(source) {
            Ok(ranges) => (
                attribute(lines, &ranges),
                Attribution::Applied {
                    ranges: ranges.len(),
                },
            ),
            Err(e) => {
                warn!(path, error = %e, "Call-range scan failed; showing raw counts");
                (
                    lines.to_vec(),
                    Attribution::Unavailable {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}
