//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests

pub mod serve;
pub mod show;
pub mod summary;

pub use serve::{apply_emit_overrides, execute_serve, format_viewer_url};
pub use show::{execute_show, read_source_lines};
pub use summary::{execute_summary, summary_body};

use crate::commands::SourceArgs;
use crate::error::CliResult;
use heatline::{CoverageEngine, HeatlineConfig, LcovCollector};
use std::sync::Arc;
use tracing::warn;

/// Merge the config file (if any) with command-line overrides
pub fn resolve_config(source: &SourceArgs) -> CliResult<HeatlineConfig> {
    let mut config = match &source.config {
        Some(path) => HeatlineConfig::load(path)?,
        None => HeatlineConfig::new(std::env::current_dir()?),
    };
    if let Some(root) = &source.root {
        config.project_root.clone_from(root);
    }
    match std::fs::canonicalize(&config.project_root) {
        Ok(absolute) => config.project_root = absolute,
        Err(e) => warn!(
            root = %config.project_root.display(),
            error = %e,
            "Project root is not accessible; using it as given"
        ),
    }
    config.exclude.extend(source.exclude.iter().cloned());
    config.validate()?;
    Ok(config)
}

/// Build and start an engine reading the LCOV tracefile
pub fn build_engine(source: &SourceArgs, config: &HeatlineConfig) -> CliResult<CoverageEngine> {
    let collector = Arc::new(LcovCollector::new(&source.lcov));
    let engine = CoverageEngine::from_config(config, collector)?;
    engine.start()?;
    Ok(engine)
}

#[cfg(test)]
pub(crate) mod fixture {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use crate::commands::SourceArgs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub const MAIN_RS: &str =
        "fn main() {\n    let x = add(\n        1,\n        2,\n    );\n    println!(\"{x}\");\n}\n";

    /// Project with `main.rs`, `skip.rs` and an LCOV tracefile
    pub struct Project {
        _dir: TempDir,
        pub root: PathBuf,
    }

    impl Project {
        pub fn source_args(&self) -> SourceArgs {
            SourceArgs {
                config: None,
                root: Some(self.root.clone()),
                lcov: self.root.join("lcov.info"),
                exclude: Vec::new(),
            }
        }
    }

    pub fn project() -> Project {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        std::fs::write(root.join("main.rs"), MAIN_RS).unwrap();
        std::fs::write(root.join("skip.rs"), "fn skip() {}\n").unwrap();
        let trace = format!(
            "SF:{root}/main.rs\nDA:2,6\nDA:6,1\nend_of_record\nSF:{root}/skip.rs\nDA:1,9\nend_of_record\nSF:/usr/lib/other.rs\nDA:1,50\nend_of_record\n",
            root = root.display()
        );
        std::fs::write(root.join("lcov.info"), trace).unwrap();
        Project { _dir: dir, root }
    }
}
