//! Serve command handler

use super::{build_engine, resolve_config};
use crate::commands::ServeArgs;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use crate::render::VIEWER_PATH;
use crate::viewer;
use heatline::{EmitConfig, HeatlineConfig};
use std::net::SocketAddr;
use tracing::info;

/// Apply `--emit`, `--interval-ms` and `--flush-on-shutdown`
///
/// Flags only adjust an emit block; without `--emit` or an `emit` entry
/// in the config file nothing is streamed.
pub fn apply_emit_overrides(config: &mut HeatlineConfig, args: &ServeArgs) {
    if let Some(path) = &args.emit {
        let emit = config
            .emit
            .take()
            .map_or_else(|| EmitConfig::new(path), |existing| EmitConfig {
                path: path.clone(),
                ..existing
            });
        config.emit = Some(emit);
    }
    if let Some(emit) = config.emit.as_mut() {
        if let Some(ms) = args.interval_ms {
            emit.interval_ms = ms;
        }
        if args.flush_on_shutdown {
            emit.flush_on_shutdown = true;
        }
    }
}

/// Viewer URL for a bound address
#[must_use]
pub fn format_viewer_url(addr: SocketAddr) -> String {
    format!("http://{addr}{VIEWER_PATH}")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

/// Execute the serve command
///
/// Runs until Ctrl+C, then stops the emitter (flushing if configured).
pub async fn execute_serve(args: &ServeArgs, reporter: &Reporter) -> CliResult<()> {
    let mut config = resolve_config(&args.source)?;
    apply_emit_overrides(&mut config, args);
    config.validate()?;
    let engine = build_engine(&args.source, &config)?;

    let emitter = match &config.emit {
        Some(emit) => {
            let handle = engine.emitter(emit.clone())?.spawn();
            reporter.info(&format!(
                "Streaming coverage deltas to {} every {} ms",
                emit.path.display(),
                emit.interval_ms
            ));
            Some(handle)
        }
        None => None,
    };

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::server(format!("cannot bind {addr}: {e}")))?;
    let bound = listener.local_addr()?;
    reporter.success(&format!("Coverage viewer at {}", format_viewer_url(bound)));
    reporter.info("Press Ctrl+C to stop");

    let served = axum::serve(listener, viewer::router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CliError::server(e.to_string()));

    if let Some(handle) = emitter {
        handle.shutdown().await?;
    }
    served
}
