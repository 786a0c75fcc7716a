//! Heat Tiers
//!
//! Coarse decile buckets for coloring files and lines. A tier is
//! `floor(value * 10 / denominator) * 10`, where the denominator is the
//! relevant maximum plus one. The `+ 1` keeps the divisor non-zero and
//! keeps the top bucket at 90.

use crate::snapshot::{total_hits, LineRecord, ProjectSnapshot};
use serde::{Deserialize, Serialize};

/// Highest tier a value can land in
pub const TOP_TIER: u8 = 90;

/// Decile bucket of `value` against `denominator`
///
/// Returns one of `0, 10, ..., 90`. A zero denominator yields 0.
#[must_use]
pub fn tier(value: u64, denominator: u64) -> u8 {
    if denominator == 0 {
        return 0;
    }
    let decile = (u128::from(value) * 10 / u128::from(denominator)).min(9);
    (decile * 10) as u8
}

/// Project-wide aggregate used for the file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// File with the largest total; first in path order on ties
    pub file_with_max_total: Option<String>,
    /// Largest per-file total plus one
    pub project_max_total: u64,
}

/// Compute the project summary of a snapshot
#[must_use]
pub fn summarize(snapshot: &ProjectSnapshot) -> Summary {
    let mut best: Option<(&str, u64)> = None;
    for (path, lines) in snapshot.iter() {
        let total = total_hits(lines);
        if best.map_or(true, |(_, max)| total > max) {
            best = Some((path.as_str(), total));
        }
    }
    Summary {
        file_with_max_total: best.map(|(path, _)| path.to_string()),
        project_max_total: best.map_or(0, |(_, max)| max).saturating_add(1),
    }
}

/// Sidebar row for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeat {
    /// Project-relative path
    pub path: String,
    /// Sum of executable counts
    pub total: u64,
    /// Tier against the project maximum
    pub tier: u8,
}

/// Per-file totals and tiers in path order
#[must_use]
pub fn file_heats(snapshot: &ProjectSnapshot, summary: &Summary) -> Vec<FileHeat> {
    snapshot
        .iter()
        .map(|(path, lines)| {
            let total = total_hits(lines);
            FileHeat {
                path: path.clone(),
                total,
                tier: tier(total, summary.project_max_total),
            }
        })
        .collect()
}

/// One rendered source line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineHeat {
    /// 1-based line number
    pub lineno: usize,
    /// Effective count (after attribution when available)
    pub record: LineRecord,
    /// Tier against the file maximum
    pub tier: u8,
}

/// Per-line tiers within one file
///
/// The denominator is the largest count in `lines` plus one; lines that
/// are not executable bucket as zero.
#[must_use]
pub fn line_heats(lines: &[LineRecord]) -> Vec<LineHeat> {
    let denominator = crate::attribution::max_count(lines)
        .unwrap_or(0)
        .saturating_add(1);
    lines
        .iter()
        .enumerate()
        .map(|(idx, record)| LineHeat {
            lineno: idx + 1,
            record: *record,
            tier: tier(record.count_or_zero(), denominator),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use LineRecord::{HitCount, NotExecutable};

    fn snapshot() -> ProjectSnapshot {
        [
            ("a.rb".to_string(), vec![HitCount(2), NotExecutable, HitCount(3)]),
            ("b.rb".to_string(), vec![HitCount(12)]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_summary_example() {
        let summary = summarize(&snapshot());
        assert_eq!(summary.project_max_total, 13);
        assert_eq!(summary.file_with_max_total.as_deref(), Some("b.rb"));
        assert_eq!(tier(12, 13), 90);
        assert_eq!(tier(5, 13), 30);
    }

    #[test]
    fn test_summary_all_zero_has_live_divisor() {
        let snap: ProjectSnapshot = [("a.rs".to_string(), vec![HitCount(0), NotExecutable])]
            .into_iter()
            .collect();
        let summary = summarize(&snap);
        assert_eq!(summary.project_max_total, 1);
        assert_eq!(summary.file_with_max_total.as_deref(), Some("a.rs"));
        assert_eq!(tier(0, summary.project_max_total), 0);
    }

    #[test]
    fn test_summary_of_empty_snapshot() {
        let summary = summarize(&ProjectSnapshot::new());
        assert_eq!(summary.file_with_max_total, None);
        assert_eq!(summary.project_max_total, 1);
    }

    #[test]
    fn test_summary_ties_pick_first_path() {
        let snap: ProjectSnapshot = [
            ("z.rs".to_string(), vec![HitCount(4)]),
            ("m.rs".to_string(), vec![HitCount(4)]),
            ("a.rs".to_string(), vec![HitCount(1)]),
        ]
        .into_iter()
        .collect();
        for _ in 0..3 {
            assert_eq!(summarize(&snap).file_with_max_total.as_deref(), Some("m.rs"));
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier(0, 10), 0);
        assert_eq!(tier(1, 10), 10);
        assert_eq!(tier(9, 10), 90);
        assert_eq!(tier(99, 100), 90);
        assert_eq!(tier(u64::MAX - 1, u64::MAX), 90);
    }

    #[test]
    fn test_tier_never_reaches_hundred() {
        assert_eq!(tier(10, 10), TOP_TIER);
        assert_eq!(tier(500, 1), TOP_TIER);
        assert_eq!(tier(5, 0), 0);
    }

    #[test]
    fn test_file_heats_in_path_order() {
        let snap = snapshot();
        let summary = summarize(&snap);
        let heats = file_heats(&snap, &summary);
        assert_eq!(
            heats,
            vec![
                FileHeat { path: "a.rb".to_string(), total: 5, tier: 30 },
                FileHeat { path: "b.rb".to_string(), total: 12, tier: 90 },
            ]
        );
    }

    #[test]
    fn test_line_heats_use_file_maximum() {
        let heats = line_heats(&[NotExecutable, HitCount(1), HitCount(19)]);
        assert_eq!(heats[0].tier, 0);
        assert_eq!(heats[0].lineno, 1);
        assert_eq!(heats[1].tier, 0);
        assert_eq!(heats[2].tier, 90);
        assert_eq!(heats[2].record, HitCount(19));
    }

    #[test]
    fn test_line_heats_without_executable_lines() {
        let heats = line_heats(&[NotExecutable, NotExecutable]);
        assert!(heats.iter().all(|h| h.tier == 0));
    }

    proptest! {
        #[test]
        fn prop_tier_monotonic(a in 0u64..10_000, b in 0u64..10_000, d in 1u64..10_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(tier(lo, d) <= tier(hi, d));
        }

        #[test]
        fn prop_tier_is_decile(x in any::<u64>(), d in any::<u64>()) {
            let t = tier(x, d);
            prop_assert!(t <= TOP_TIER && t % 10 == 0);
        }

        #[test]
        fn prop_max_total_lands_in_top_tier(max in 9u64..1_000_000) {
            prop_assert_eq!(tier(max, max + 1), TOP_TIER);
        }
    }
}
