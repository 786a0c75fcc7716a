//! Summary command handler

use super::{build_engine, resolve_config};
use crate::commands::{OutputFormat, SummaryArgs};
use crate::error::CliResult;
use crate::output::Reporter;
use crate::viewer::SummaryBody;
use heatline::{file_heats, CoverageEngine};

/// Current summary and sidebar rows
pub fn summary_body(engine: &CoverageEngine) -> CliResult<SummaryBody> {
    let snapshot = engine.snapshot()?;
    let summary = engine.summary(&snapshot);
    let files = file_heats(&snapshot, &summary);
    Ok(SummaryBody { summary, files })
}

/// Execute the summary command
pub fn execute_summary(args: &SummaryArgs, reporter: &Reporter) -> CliResult<()> {
    let config = resolve_config(&args.source)?;
    let engine = build_engine(&args.source, &config)?;
    let body = summary_body(&engine)?;

    match args.format {
        OutputFormat::Json => reporter.data(&serde_json::to_string_pretty(&body)?),
        OutputFormat::Text => {
            reporter.header(&format!("Coverage of {}", engine.project_root()));
            if body.files.is_empty() {
                reporter.warning("No project files in the tracefile");
                return Ok(());
            }
            reporter.file_table(&body.files);
            if let Some(hottest) = &body.summary.file_with_max_total {
                reporter.info(&format!(
                    "{} files; most executed: {hottest} ({} hits)",
                    body.files.len(),
                    body.summary.project_max_total - 1
                ));
            }
        }
    }
    Ok(())
}
