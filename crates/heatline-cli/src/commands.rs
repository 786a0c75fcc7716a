//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Heatline: live line-coverage heatmaps for running programs
#[derive(Parser, Debug)]
#[command(name = "heatline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the coverage viewer and optionally stream deltas to a file
    Serve(ServeArgs),

    /// Print per-file totals and heat tiers
    Summary(SummaryArgs),

    /// Print the attributed line counts of one file
    Show(ShowArgs),
}

/// Where coverage comes from and which files belong to the project
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root (overrides the config file; default: current directory)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// LCOV tracefile kept up to date by the coverage runtime
    #[arg(long, value_name = "FILE", default_value = "lcov.info")]
    pub lcov: PathBuf,

    /// Exclude files matching a glob relative to the root
    ///
    /// Can be specified multiple times: --exclude "vendor/**/*.rs" --exclude build.rs
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Coverage source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// HTTP port to listen on
    #[arg(short, long, default_value = "7878")]
    pub port: u16,

    /// Stream coverage deltas to this JSON file
    #[arg(long, value_name = "FILE")]
    pub emit: Option<PathBuf>,

    /// Milliseconds between emitted deltas
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Write one full snapshot to the emit file on shutdown
    #[arg(long)]
    pub flush_on_shutdown: bool,
}

/// Arguments for the summary command
#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    /// Coverage source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the show command
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Project-relative file path (default: the file with the most hits)
    pub path: Option<String>,

    /// Coverage source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for terminal commands
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
