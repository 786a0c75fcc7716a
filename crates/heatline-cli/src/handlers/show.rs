//! Show command handler

use super::{build_engine, resolve_config};
use crate::commands::{OutputFormat, ShowArgs};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use heatline::{Attribution, FileReport};
use std::path::Path;

/// Source lines of a project file; empty if unreadable
#[must_use]
pub fn read_source_lines(project_root: &str, path: &str) -> Vec<String> {
    std::fs::read_to_string(Path::new(&format!("{project_root}{path}")))
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Execute the show command
pub fn execute_show(args: &ShowArgs, reporter: &Reporter) -> CliResult<()> {
    let config = resolve_config(&args.source)?;
    let engine = build_engine(&args.source, &config)?;
    let snapshot = engine.snapshot()?;
    let summary = engine.summary(&snapshot);
    let report = engine.file_report(args.path.as_deref(), &snapshot, &summary);

    let FileReport::Lines {
        path,
        lines,
        attribution,
    } = &report
    else {
        return Err(CliError::not_shown(report.message().unwrap_or_default()));
    };

    match args.format {
        OutputFormat::Json => reporter.data(&serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if let Attribution::Unavailable { reason } = attribution {
                reporter.warning(&format!("Showing raw counts: {reason}"));
            }
            reporter.header(path);
            let source = read_source_lines(engine.project_root(), path);
            reporter.line_table(&source, lines);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::fixture::{project, MAIN_RS};

    fn args(path: Option<&str>) -> (crate::handlers::fixture::Project, ShowArgs) {
        let project = project();
        let args = ShowArgs {
            path: path.map(str::to_string),
            source: project.source_args(),
            format: OutputFormat::Text,
        };
        (project, args)
    }

    #[test]
    fn test_read_source_lines() {
        let (project, _) = args(None);
        let root = format!("{}/", project.root.display());
        let lines = read_source_lines(&root, "main.rs");
        assert_eq!(lines.len(), MAIN_RS.lines().count());
        assert!(read_source_lines(&root, "absent.rs").is_empty());
    }

    #[test]
    fn test_show_attributed_file() {
        let (_project, args) = args(Some("main.rs"));
        execute_show(&args, &Reporter::new(false, true)).unwrap();
    }

    #[test]
    fn test_show_defaults_to_hottest_file() {
        let (_project, args) = args(None);
        execute_show(&args, &Reporter::new(false, true)).unwrap();
    }

    #[test]
    fn test_show_uncovered_file_is_explained() {
        let (_project, args) = args(Some("README.md"));
        let err = execute_show(&args, &Reporter::new(false, true)).unwrap_err();
        assert_eq!(err.to_string(), "There is no coverage result for README.md");
    }

    #[test]
    fn test_show_missing_file_is_explained() {
        let (project, args) = args(Some("skip.rs"));
        std::fs::remove_file(project.root.join("skip.rs")).unwrap();
        let err = execute_show(&args, &Reporter::new(false, true)).unwrap_err();
        assert_eq!(err.to_string(), "skip.rs not found");
    }
}
