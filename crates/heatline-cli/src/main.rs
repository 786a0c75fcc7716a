//! Heatline CLI: live line-coverage heatmaps
//!
//! ## Usage
//!
//! ```bash
//! heatline summary --root . --lcov lcov.info       # Per-file heat tiers
//! heatline show src/main.rs                        # Attributed line counts
//! heatline serve --emit target/heatline/cov.json   # Viewer plus delta stream
//! ```

use clap::Parser;
use heatline_cli::{
    handlers::{execute_serve, execute_show, execute_summary},
    Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, Reporter, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(config.verbosity, cli.log_json);

    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());

    match cli.command {
        Commands::Summary(args) => execute_summary(&args, &reporter),
        Commands::Show(args) => execute_show(&args, &reporter),
        Commands::Serve(args) => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| CliError::server(format!("Failed to create runtime: {e}")))?;
            rt.block_on(execute_serve(&args, &reporter))
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
}

fn init_logging(verbosity: Verbosity, json: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive())),
        )
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
