//! Emitted File Format
//!
//! ```text
//! {
//!   "clear": true,                      // first emission only
//!   "src/app.rs": { "lines": [null, 3, 0, null] },
//!   ...
//! }
//! ```
//!
//! `null` marks a line that is not executable; integers are hit counts or
//! hit-count deltas. A file path spelled `clear` cannot be represented.

use super::baseline::Delta;
use crate::snapshot::{LineRecord, ProjectSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct FileLinesRef<'a> {
    lines: &'a [LineRecord],
}

#[derive(Debug, Serialize)]
struct PayloadRef<'a> {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    clear: bool,
    #[serde(flatten)]
    files: BTreeMap<&'a str, FileLinesRef<'a>>,
}

/// Serialize a delta; `clear` marks the first emission of the process
///
/// # Errors
///
/// Returns error if JSON serialization fails
pub fn encode_delta(delta: &Delta, clear: bool) -> serde_json::Result<Vec<u8>> {
    let payload = PayloadRef {
        clear,
        files: delta
            .iter()
            .map(|(path, file)| (path.as_str(), FileLinesRef { lines: &file.lines }))
            .collect(),
    };
    serde_json::to_vec(&payload)
}

/// Serialize full cumulative counts; always carries `clear`
///
/// # Errors
///
/// Returns error if JSON serialization fails
pub fn encode_snapshot(snapshot: &ProjectSnapshot) -> serde_json::Result<Vec<u8>> {
    let payload = PayloadRef {
        clear: true,
        files: snapshot
            .iter()
            .map(|(path, lines)| (path.as_str(), FileLinesRef { lines }))
            .collect(),
    };
    serde_json::to_vec(&payload)
}

/// Lines of one file in a decoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLines {
    /// One record per source line
    pub lines: Vec<LineRecord>,
}

/// A decoded emission, as a downstream consumer sees it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedPayload {
    /// Discard previously accumulated state before applying
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clear: bool,
    /// Per-file lines
    #[serde(flatten)]
    pub files: BTreeMap<String, FileLines>,
}

impl EmittedPayload {
    /// Decode a payload
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid payload
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Fold this payload into cumulative per-file counts
    ///
    /// A file with no state, or whose line count differs from the held
    /// state, is replaced; otherwise counts are added elementwise.
    pub fn accumulate_into(self, state: &mut BTreeMap<String, Vec<LineRecord>>) {
        if self.clear {
            state.clear();
        }
        for (path, file) in self.files {
            match state.get_mut(&path) {
                Some(held) if held.len() == file.lines.len() => {
                    for (slot, delta) in held.iter_mut().zip(file.lines) {
                        *slot = match (*slot, delta) {
                            (LineRecord::HitCount(total), LineRecord::HitCount(d)) => {
                                LineRecord::HitCount(total.saturating_add(d))
                            }
                            (held, LineRecord::NotExecutable) => held,
                            (LineRecord::NotExecutable, fresh) => fresh,
                        };
                    }
                }
                _ => {
                    let _ = state.insert(path, file.lines);
                }
            }
        }
    }
}
