//! Heatline CLI Library
//!
//! Command-line interface and coverage viewer for the Heatline engine.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;
pub mod render;
pub mod viewer;

pub use commands::{
    Cli, ColorArg, Commands, OutputFormat, ServeArgs, ShowArgs, SourceArgs, SummaryArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{display_rows, format_file_row, format_line_row, tier_style, Reporter};
