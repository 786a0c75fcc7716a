//! In-process line counters
//!
//! For programs that report their own line hits (generated
//! instrumentation, interpreters embedding Heatline).

use super::LineCollector;
use crate::result::{HeatlineError, HeatlineResult};
use crate::snapshot::{LineRecord, RawSnapshot};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Collector backed by counters held in this process
#[derive(Debug, Default)]
pub struct InMemoryCollector {
    running: AtomicBool,
    files: Mutex<BTreeMap<String, Vec<LineRecord>>>,
}

impl InMemoryCollector {
    /// Create a stopped collector with no files
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and its executable lines (1-based)
    ///
    /// Re-registering a file replaces its counters, which is what happens
    /// when a source file is reloaded after an edit.
    ///
    /// # Errors
    ///
    /// Returns [`HeatlineError::LockPoisoned`] if a thread panicked while
    /// holding the counters
    pub fn register_file<I>(
        &self,
        path: impl Into<String>,
        line_count: usize,
        executable: I,
    ) -> HeatlineResult<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut lines = vec![LineRecord::NotExecutable; line_count];
        for lineno in executable {
            if let Some(slot) = lineno.checked_sub(1).and_then(|idx| lines.get_mut(idx)) {
                *slot = LineRecord::HitCount(0);
            }
        }
        let _ = self.lock()?.insert(path.into(), lines);
        Ok(())
    }

    /// Record one execution of a line
    ///
    /// Returns `false` when the hit was dropped: the collector is not
    /// running, the file is unknown, or the line is not executable.
    pub fn record_hit(&self, path: &str, lineno: usize) -> bool {
        self.record_hits(path, lineno, 1)
    }

    /// Record `count` executions of a line
    pub fn record_hits(&self, path: &str, lineno: usize, count: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        let Ok(mut files) = self.files.lock() else {
            return false;
        };
        let slot = files
            .get_mut(path)
            .and_then(|lines| lineno.checked_sub(1).and_then(|idx| lines.get_mut(idx)));
        match slot {
            Some(LineRecord::HitCount(n)) => {
                *n = n.saturating_add(count);
                true
            }
            _ => false,
        }
    }

    /// Check if hits are being recorded
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn lock(&self) -> HeatlineResult<MutexGuard<'_, BTreeMap<String, Vec<LineRecord>>>> {
        self.files
            .lock()
            .map_err(|_| HeatlineError::LockPoisoned { what: "line counters" })
    }
}

impl LineCollector for InMemoryCollector {
    fn start(&self) -> HeatlineResult<()> {
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn peek(&self) -> HeatlineResult<RawSnapshot> {
        let files = self.lock()?;
        Ok(files
            .iter()
            .map(|(path, lines)| (path.clone(), lines.clone()))
            .collect())
    }

    fn clear(&self) -> HeatlineResult<()> {
        let mut files = self.lock()?;
        for record in files.values_mut().flatten() {
            if let LineRecord::HitCount(n) = record {
                *n = 0;
            }
        }
        Ok(())
    }
}
