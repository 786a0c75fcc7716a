//! Baseline and Delta computation

use crate::snapshot::{LineRecord, ProjectSnapshot};
use std::collections::BTreeMap;

/// How a file's delta was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// File was new to the baseline or changed length; lines are full counts
    Full,
    /// Elementwise `current - previous`
    Diff,
}

/// Delta of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDelta {
    /// How the lines were computed
    pub kind: DeltaKind,
    /// One record per source line
    pub lines: Vec<LineRecord>,
}

/// Change since the previous successful sample, keyed by project path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    files: BTreeMap<String, FileDelta>,
}

impl Delta {
    /// Delta of a file
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FileDelta> {
        self.files.get(path)
    }

    /// Iterate files in path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileDelta)> {
        self.files.iter()
    }

    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the delta is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if every file is a full copy
    #[must_use]
    pub fn is_all_full(&self) -> bool {
        self.files.values().all(|file| file.kind == DeltaKind::Full)
    }
}

/// Elementwise `current - previous`
///
/// A position that is not executable on either side stays not executable.
/// Counts only grow between resets; a shrinking count saturates at zero.
#[must_use]
pub fn diff_lines(current: &[LineRecord], previous: &[LineRecord]) -> Vec<LineRecord> {
    current
        .iter()
        .zip(previous)
        .map(|(now, before)| match (now, before) {
            (LineRecord::HitCount(n), LineRecord::HitCount(p)) => {
                LineRecord::HitCount(n.saturating_sub(*p))
            }
            _ => LineRecord::NotExecutable,
        })
        .collect()
}

/// Previous sample held by the diff emitter
///
/// The generation changes on every [`Baseline::clear`]. An emitter that
/// has not yet written in the current generation marks its next payload
/// with `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    files: BTreeMap<String, Vec<LineRecord>>,
    generation: u64,
}

impl Baseline {
    /// Create an empty baseline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta of `current` against this baseline
    #[must_use]
    pub fn delta(&self, current: &ProjectSnapshot) -> Delta {
        let files = current
            .iter()
            .map(|(path, lines)| {
                let file = match self.files.get(path) {
                    Some(previous) if previous.len() == lines.len() => FileDelta {
                        kind: DeltaKind::Diff,
                        lines: diff_lines(lines, previous),
                    },
                    _ => FileDelta {
                        kind: DeltaKind::Full,
                        lines: lines.clone(),
                    },
                };
                (path.clone(), file)
            })
            .collect();
        Delta { files }
    }

    /// Compute the delta and make `current` the new baseline
    pub fn advance(&mut self, current: ProjectSnapshot) -> Delta {
        let delta = self.delta(&current);
        self.files = current.into_files();
        delta
    }

    /// Forget the previous sample and start a new generation
    pub fn clear(&mut self) {
        self.files.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Number of clears so far
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of files held
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no sample is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use LineRecord::{HitCount, NotExecutable};

    fn snap(entries: &[(&str, Vec<LineRecord>)]) -> ProjectSnapshot {
        entries
            .iter()
            .map(|(path, lines)| ((*path).to_string(), lines.clone()))
            .collect()
    }

    #[test]
    fn test_diff_lines_subtracts_and_keeps_not_executable() {
        let current = [NotExecutable, HitCount(5), HitCount(3), HitCount(2)];
        let previous = [NotExecutable, HitCount(2), NotExecutable, HitCount(2)];
        assert_eq!(
            diff_lines(&current, &previous),
            vec![NotExecutable, HitCount(3), NotExecutable, HitCount(0)]
        );
    }

    #[test]
    fn test_diff_lines_saturates_on_shrinking_count() {
        assert_eq!(diff_lines(&[HitCount(1)], &[HitCount(4)]), vec![HitCount(0)]);
    }

    #[test]
    fn test_first_delta_is_full_copy() {
        let baseline = Baseline::new();
        let current = snap(&[("a.rs", vec![NotExecutable, HitCount(2)])]);
        let delta = baseline.delta(&current);
        let file = delta.get("a.rs").unwrap();
        assert_eq!(file.kind, DeltaKind::Full);
        assert_eq!(file.lines, vec![NotExecutable, HitCount(2)]);
    }

    #[test]
    fn test_advance_diffs_against_previous_sample() {
        let mut baseline = Baseline::new();
        let _ = baseline.advance(snap(&[("a.rs", vec![HitCount(1), HitCount(1)])]));
        let delta = baseline.advance(snap(&[("a.rs", vec![HitCount(4), HitCount(1)])]));
        let file = delta.get("a.rs").unwrap();
        assert_eq!(file.kind, DeltaKind::Diff);
        assert_eq!(file.lines, vec![HitCount(3), HitCount(0)]);
    }

    #[test]
    fn test_length_change_forces_full_copy() {
        let mut baseline = Baseline::new();
        let _ = baseline.advance(snap(&[("a.rs", vec![HitCount(1)])]));
        let delta = baseline.advance(snap(&[("a.rs", vec![HitCount(1), HitCount(7)])]));
        let file = delta.get("a.rs").unwrap();
        assert_eq!(file.kind, DeltaKind::Full);
        assert_eq!(file.lines, vec![HitCount(1), HitCount(7)]);
    }

    #[test]
    fn test_new_file_beside_known_file() {
        let mut baseline = Baseline::new();
        let _ = baseline.advance(snap(&[("a.rs", vec![HitCount(1)])]));
        let delta = baseline.advance(snap(&[
            ("a.rs", vec![HitCount(2)]),
            ("b.rs", vec![HitCount(9)]),
        ]));
        assert_eq!(delta.get("a.rs").unwrap().kind, DeltaKind::Diff);
        assert_eq!(delta.get("b.rs").unwrap().kind, DeltaKind::Full);
        assert!(!delta.is_all_full());
    }

    #[test]
    fn test_clear_makes_every_file_new() {
        let mut baseline = Baseline::new();
        let _ = baseline.advance(snap(&[("a.rs", vec![HitCount(1)]), ("b.rs", vec![])]));
        assert_eq!(baseline.len(), 2);
        baseline.clear();
        assert!(baseline.is_empty());
        assert_eq!(baseline.generation(), 1);
        let delta = baseline.delta(&snap(&[("a.rs", vec![HitCount(3)])]));
        assert!(delta.is_all_full());
    }

    #[test]
    fn test_files_missing_from_current_are_not_reported() {
        let mut baseline = Baseline::new();
        let _ = baseline.advance(snap(&[("gone.rs", vec![HitCount(1)])]));
        let delta = baseline.advance(snap(&[]));
        assert!(delta.is_empty());
    }
}
