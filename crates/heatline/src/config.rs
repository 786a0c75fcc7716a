//! Engine configuration
//!
//! Loaded from YAML (`heatline.yaml`) or built in code:
//!
//! ```yaml
//! project_root: /srv/app
//! exclude:
//!   - "vendor/**/*.rs"
//!   - "config/*.rs"
//! emit:
//!   path: /var/log/heatline/coverage.json
//!   interval_ms: 1000
//!   flush_on_shutdown: true
//! ```

use crate::result::{HeatlineError, HeatlineResult};
use crate::snapshot::{ExclusionSet, SnapshotFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default emitter interval
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

/// Periodic delta export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitConfig {
    /// File rewritten on every tick
    pub path: PathBuf,
    /// Pause between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Write one full cumulative snapshot when the emitter stops
    #[serde(default)]
    pub flush_on_shutdown: bool,
}

impl EmitConfig {
    /// Create an emit config with the default interval
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            interval_ms: DEFAULT_INTERVAL_MS,
            flush_on_shutdown: false,
        }
    }

    /// Set the interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Flush a full snapshot on shutdown
    #[must_use]
    pub const fn with_flush_on_shutdown(mut self, enabled: bool) -> Self {
        self.flush_on_shutdown = enabled;
        self
    }

    /// Interval as a duration
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validate the settings
    ///
    /// # Errors
    ///
    /// Returns error on an empty path or a zero interval
    pub fn validate(&self) -> HeatlineResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(HeatlineError::config("emit.path must not be empty"));
        }
        if self.interval_ms == 0 {
            return Err(HeatlineError::config("emit.interval_ms must be greater than 0"));
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatlineConfig {
    /// Directory whose files make up the project
    pub project_root: PathBuf,
    /// Glob patterns, relative to the root, removed from snapshots
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Periodic delta export
    #[serde(default)]
    pub emit: Option<EmitConfig>,
}

impl HeatlineConfig {
    /// Create a config for a project root
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            exclude: Vec::new(),
            emit: None,
        }
    }

    /// Add exclusion patterns
    #[must_use]
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Enable periodic delta export
    #[must_use]
    pub fn with_emit(mut self, emit: EmitConfig) -> Self {
        self.emit = Some(emit);
        self
    }

    /// Parse YAML text
    ///
    /// # Errors
    ///
    /// Returns error on invalid YAML or invalid settings
    pub fn from_yaml_str(text: &str) -> HeatlineResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is invalid
    pub fn load(path: &Path) -> HeatlineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Validate the settings
    ///
    /// # Errors
    ///
    /// Returns error on an empty root or invalid emit block
    pub fn validate(&self) -> HeatlineResult<()> {
        if self.project_root.as_os_str().is_empty() {
            return Err(HeatlineError::config("project_root must not be empty"));
        }
        if let Some(emit) = &self.emit {
            emit.validate()?;
        }
        Ok(())
    }

    /// Expand the exclusion patterns
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is not a valid glob
    pub fn exclusion_set(&self) -> HeatlineResult<ExclusionSet> {
        ExclusionSet::expand(&self.project_root, &self.exclude)
    }

    /// Build the snapshot filter for this project
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is not a valid glob
    pub fn snapshot_filter(&self) -> HeatlineResult<SnapshotFilter> {
        Ok(SnapshotFilter::new(
            &self.project_root.to_string_lossy(),
            self.exclusion_set()?,
        ))
    }
}
