//! Multi-line Call Scanning
//!
//! Line counters attribute a call to the line of its name only. When the
//! argument list runs onto later lines those lines look unexecuted. A
//! scanner finds such calls so the attributor can spread the count.

mod rust;

pub use rust::{scan_source, RustCallScanner};

use crate::result::HeatlineResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A call whose argument list ends on a later line than its name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallRange {
    /// Called function, method or macro
    pub name: String,
    /// Line of the call name (1-based); the only line carrying a count
    pub start_line: usize,
    /// Line where the argument list ends (1-based, inclusive)
    pub end_line: usize,
}

impl CallRange {
    /// Create a range
    #[must_use]
    pub fn new(name: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            name: name.into(),
            start_line,
            end_line,
        }
    }

    /// Number of lines spanned
    #[must_use]
    pub const fn span(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Produces the multi-line call ranges of a source file
pub trait CallScanner: Send + Sync + std::fmt::Debug {
    /// Parse `path` and return its multi-line calls in source order
    ///
    /// # Errors
    ///
    /// Returns [`crate::HeatlineError::Parse`] when the file cannot be
    /// parsed and [`crate::HeatlineError::Io`] when it cannot be read.
    fn scan(&self, path: &Path) -> HeatlineResult<Vec<CallRange>>;
}
