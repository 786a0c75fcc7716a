//! Diff Emitter
//!
//! A background task that samples the collector at a fixed interval and
//! rewrites one JSON file with the change since the previous sample. A
//! consumer that sums every emitted file (starting over whenever `clear`
//! is present) reconstructs the cumulative counts. `clear` is sent with
//! the first write and again with the first write after every reset.
//!
//! The baseline is shared with [`crate::CoverageEngine::reset`]; a tick
//! takes the baseline lock before peeking so a reset lands either wholly
//! before or wholly after the sample.

mod baseline;
mod payload;


pub use baseline::{diff_lines, Baseline, Delta, DeltaKind, FileDelta};
pub use payload::{encode_delta, encode_snapshot, EmittedPayload, FileLines};

use crate::collector::LineCollector;
use crate::config::EmitConfig;
use crate::result::{HeatlineError, HeatlineResult};
use crate::snapshot::SnapshotFilter;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub(crate) fn lock_baseline(baseline: &Mutex<Baseline>) -> HeatlineResult<MutexGuard<'_, Baseline>> {
    baseline
        .lock()
        .map_err(|_| HeatlineError::LockPoisoned { what: "emitter baseline" })
}

async fn run_blocking<T, F>(work: F) -> HeatlineResult<T>
where
    F: FnOnce() -> HeatlineResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| HeatlineError::EmitterTask {
            message: e.to_string(),
        })?
}

/// Periodic delta writer
#[derive(Debug)]
pub struct DiffEmitter {
    collector: Arc<dyn LineCollector>,
    filter: Arc<SnapshotFilter>,
    baseline: Arc<Mutex<Baseline>>,
    config: EmitConfig,
    /// Baseline generation of the last successful write
    written_generation: Option<u64>,
}

impl DiffEmitter {
    /// Create an emitter; creates the output directory if needed
    pub(crate) fn new(
        collector: Arc<dyn LineCollector>,
        filter: Arc<SnapshotFilter>,
        baseline: Arc<Mutex<Baseline>>,
        config: EmitConfig,
    ) -> HeatlineResult<Self> {
        config.validate()?;
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            collector,
            filter,
            baseline,
            config,
            written_generation: None,
        })
    }

    /// Output file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Emitter settings
    #[must_use]
    pub const fn config(&self) -> &EmitConfig {
        &self.config
    }

    /// Check if a tick has written output yet
    #[must_use]
    pub const fn has_written(&self) -> bool {
        self.written_generation.is_some()
    }

    /// Sample once and write the delta
    ///
    /// The baseline advances as soon as the sample is taken. If the write
    /// then fails, that sample's delta is not emitted. Sampling runs on the
    /// blocking pool since collectors may read files.
    ///
    /// # Errors
    ///
    /// Returns error if the collector fails, the baseline lock is poisoned
    /// or the output file cannot be written. A collector failure leaves the
    /// baseline untouched.
    pub async fn tick(&mut self) -> HeatlineResult<Delta> {
        let collector = Arc::clone(&self.collector);
        let filter = Arc::clone(&self.filter);
        let baseline = Arc::clone(&self.baseline);
        let (delta, generation) = run_blocking(move || {
            let mut held = lock_baseline(&baseline)?;
            let raw = collector.peek()?;
            let delta = held.advance(filter.apply(raw));
            Ok((delta, held.generation()))
        })
        .await?;
        let clear = self.written_generation != Some(generation);
        let bytes = encode_delta(&delta, clear)?;
        tokio::fs::write(&self.config.path, bytes).await?;
        self.written_generation = Some(generation);
        Ok(delta)
    }

    /// Write the full cumulative counts with `clear` set
    ///
    /// # Errors
    ///
    /// Returns error if the collector fails or the file cannot be written
    pub async fn flush_full(&mut self) -> HeatlineResult<()> {
        let collector = Arc::clone(&self.collector);
        let filter = Arc::clone(&self.filter);
        let baseline = Arc::clone(&self.baseline);
        let (snapshot, generation) = run_blocking(move || {
            let held = lock_baseline(&baseline)?;
            let snapshot = filter.apply(collector.peek()?);
            Ok((snapshot, held.generation()))
        })
        .await?;
        let bytes = encode_snapshot(&snapshot)?;
        tokio::fs::write(&self.config.path, bytes).await?;
        self.written_generation = Some(generation);
        info!(
            path = %self.config.path.display(),
            files = snapshot.len(),
            "Flushed full coverage snapshot"
        );
        Ok(())
    }

    /// Start the periodic loop on the current tokio runtime
    ///
    /// The first tick runs immediately. Dropping the returned handle stops
    /// the loop after its current tick.
    #[must_use]
    pub fn spawn(self) -> EmitterHandle {
        let (stop, stopped) = watch::channel(false);
        let task = tokio::spawn(self.run(stopped));
        EmitterHandle { stop, task }
    }

    async fn run(mut self, mut stopped: watch::Receiver<bool>) {
        debug!(
            path = %self.config.path.display(),
            interval_ms = self.config.interval_ms,
            "Coverage emitter started"
        );
        loop {
            match self.tick().await {
                Ok(delta) => debug!(files = delta.len(), "Emitted coverage delta"),
                Err(e) => warn!(error = %e, "Coverage emit failed; retrying next interval"),
            }
            tokio::select! {
                _ = stopped.changed() => break,
                () = tokio::time::sleep(self.config.interval()) => {}
            }
        }
        if self.config.flush_on_shutdown {
            if let Err(e) = self.flush_full().await {
                warn!(error = %e, "Final coverage flush failed");
            }
        }
        debug!("Coverage emitter stopped");
    }
}

/// Handle to a running emitter task
#[derive(Debug)]
pub struct EmitterHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl EmitterHandle {
    /// Check if the task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and wait for it, including the optional final flush
    ///
    /// # Errors
    ///
    /// Returns error if the task panicked or was cancelled
    pub async fn shutdown(self) -> HeatlineResult<()> {
        let _ = self.stop.send(true);
        self.task.await.map_err(|e| HeatlineError::EmitterTask {
            message: e.to_string(),
        })
    }
}
