//! LCOV tracefile collector
//!
//! Reads line data written by an external coverage runtime.
//!
//! ## Records used
//!
//! ```text
//! SF:<source file>
//! DA:<line>,<execution count>[,<checksum>]
//! end_of_record
//! ```
//!
//! Every other record (`TN`, `FN`, `BRDA`, `LF`, ...) is skipped.

use super::LineCollector;
use crate::result::{HeatlineError, HeatlineResult};
use crate::snapshot::{LineRecord, RawSnapshot};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// Largest line number accepted in a `DA` record
pub const MAX_LCOV_LINE: usize = 1 << 22;

/// Line data of one `SF` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcovRecord {
    /// Source file as written in the tracefile
    pub source: String,
    /// Hit count per 1-based line
    pub hits: BTreeMap<usize, u64>,
}

/// Parse the line data of an LCOV tracefile
///
/// # Errors
///
/// Returns a collector error on a malformed `DA` record, a `DA` line number
/// above [`MAX_LCOV_LINE`] or a `DA` outside of an `SF` section.
pub fn parse_tracefile(content: &str) -> HeatlineResult<Vec<LcovRecord>> {
    let mut records = Vec::new();
    let mut current: Option<LcovRecord> = None;

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if let Some(source) = line.strip_prefix("SF:") {
            if let Some(done) = current.take() {
                records.push(done);
            }
            current = Some(LcovRecord {
                source: source.to_string(),
                hits: BTreeMap::new(),
            });
        } else if let Some(data) = line.strip_prefix("DA:") {
            let record = current.as_mut().ok_or_else(|| {
                HeatlineError::collector(format!("tracefile line {}: DA outside of SF", idx + 1))
            })?;
            let (lineno, count) = parse_da(data).ok_or_else(|| {
                HeatlineError::collector(format!(
                    "tracefile line {}: malformed DA record `{line}`",
                    idx + 1
                ))
            })?;
            if lineno > MAX_LCOV_LINE {
                return Err(HeatlineError::collector(format!(
                    "tracefile line {}: line number {lineno} exceeds {MAX_LCOV_LINE}",
                    idx + 1
                )));
            }
            let slot = record.hits.entry(lineno).or_insert(0);
            *slot = slot.saturating_add(count);
        } else if line == "end_of_record" {
            if let Some(done) = current.take() {
                records.push(done);
            }
        }
    }
    if let Some(done) = current.take() {
        records.push(done);
    }
    Ok(records)
}

fn parse_da(data: &str) -> Option<(usize, u64)> {
    let mut parts = data.split(',');
    let lineno: usize = parts.next()?.trim().parse().ok()?;
    let count = parts.next()?.trim();
    if lineno == 0 {
        return None;
    }
    // Some producers write negative or fractional counts for "unknown"
    let count = count
        .parse::<u64>()
        .ok()
        .or_else(|| count.parse::<f64>().ok().map(|c| c.max(0.0) as u64))?;
    Some((lineno, count))
}

/// Size and mtime of a source file when its lines were counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceStamp {
    modified: Option<SystemTime>,
    len: u64,
}

/// Collector reading an LCOV tracefile on every peek
///
/// The tracefile belongs to another process, so [`LineCollector::clear`]
/// records the current counts as a zero point instead of truncating it.
/// Source line counts are cached until the file's size or mtime changes.
#[derive(Debug)]
pub struct LcovCollector {
    tracefile: PathBuf,
    zero_point: Mutex<BTreeMap<String, Vec<LineRecord>>>,
    line_counts: Mutex<HashMap<String, (SourceStamp, usize)>>,
}

impl LcovCollector {
    /// Create a collector for a tracefile
    #[must_use]
    pub fn new(tracefile: impl Into<PathBuf>) -> Self {
        Self {
            tracefile: tracefile.into(),
            zero_point: Mutex::new(BTreeMap::new()),
            line_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Path of the tracefile
    #[must_use]
    pub fn tracefile(&self) -> &Path {
        &self.tracefile
    }

    fn read_cumulative(&self) -> HeatlineResult<RawSnapshot> {
        let content = std::fs::read_to_string(&self.tracefile).map_err(|e| {
            HeatlineError::collector(format!("cannot read {}: {e}", self.tracefile.display()))
        })?;
        let base = self.tracefile.parent().unwrap_or_else(|| Path::new("."));

        let mut merged: BTreeMap<String, BTreeMap<usize, u64>> = BTreeMap::new();
        for record in parse_tracefile(&content)? {
            let source = if Path::new(&record.source).is_absolute() {
                record.source
            } else {
                base.join(&record.source).to_string_lossy().into_owned()
            };
            let hits = merged.entry(source).or_default();
            for (lineno, count) in record.hits {
                let slot = hits.entry(lineno).or_insert(0);
                *slot = slot.saturating_add(count);
            }
        }

        merged
            .into_iter()
            .map(|(source, hits)| {
                let lines = line_records(self.source_line_count(&source)?, &hits);
                Ok((source, lines))
            })
            .collect()
    }

    /// Line count of a source file on disk, 0 when unreadable
    fn source_line_count(&self, source: &str) -> HeatlineResult<usize> {
        let Ok(meta) = std::fs::metadata(source) else {
            return Ok(0);
        };
        let stamp = SourceStamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        };
        let mut cache = self
            .line_counts
            .lock()
            .map_err(|_| HeatlineError::LockPoisoned { what: "lcov line counts" })?;
        if let Some((seen, count)) = cache.get(source) {
            if *seen == stamp {
                return Ok(*count);
            }
        }
        let count = std::fs::read_to_string(source)
            .map(|text| text.lines().count())
            .unwrap_or(0);
        let _ = cache.insert(source.to_string(), (stamp, count));
        Ok(count)
    }
}

/// Expand sparse `DA` data into one record per source line
fn line_records(on_disk: usize, hits: &BTreeMap<usize, u64>) -> Vec<LineRecord> {
    let highest = hits.keys().next_back().copied().unwrap_or(0);
    let mut lines = vec![LineRecord::NotExecutable; on_disk.max(highest)];
    for (&lineno, &count) in hits {
        lines[lineno - 1] = LineRecord::HitCount(count);
    }
    lines
}

fn subtract_zero_point(current: &[LineRecord], zero: &[LineRecord]) -> Vec<LineRecord> {
    current
        .iter()
        .zip(zero)
        .map(|(now, then)| match (now, then) {
            (LineRecord::HitCount(n), LineRecord::HitCount(z)) => {
                LineRecord::HitCount(n.saturating_sub(*z))
            }
            (record, _) => *record,
        })
        .collect()
}

impl LineCollector for LcovCollector {
    fn peek(&self) -> HeatlineResult<RawSnapshot> {
        let cumulative = self.read_cumulative()?;
        let zero_point = self
            .zero_point
            .lock()
            .map_err(|_| HeatlineError::LockPoisoned { what: "lcov zero point" })?;
        if zero_point.is_empty() {
            return Ok(cumulative);
        }
        Ok(cumulative
            .into_iter()
            .map(|(path, lines)| match zero_point.get(&path) {
                Some(zero) if zero.len() == lines.len() => {
                    let adjusted = subtract_zero_point(&lines, zero);
                    (path, adjusted)
                }
                _ => (path, lines),
            })
            .collect())
    }

    fn clear(&self) -> HeatlineResult<()> {
        let cumulative = self.read_cumulative()?;
        let mut zero_point = self
            .zero_point
            .lock()
            .map_err(|_| HeatlineError::LockPoisoned { what: "lcov zero point" })?;
        *zero_point = cumulative.into_iter().collect();
        tracing::debug!(files = zero_point.len(), "lcov zero point recorded");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use LineRecord::{HitCount, NotExecutable};

    const TRACE: &str = "TN:\nSF:/nowhere/a.rs\nFN:1,main\nDA:1,3\nDA:3,0\nLF:2\nLH:1\nend_of_record\n";

    #[test]
    fn test_parse_tracefile_reads_da_records() {
        let records = parse_tracefile(TRACE).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "/nowhere/a.rs");
        assert_eq!(records[0].hits.get(&1), Some(&3));
        assert_eq!(records[0].hits.get(&3), Some(&0));
        assert_eq!(records[0].hits.get(&2), None);
    }

    #[test]
    fn test_parse_tracefile_accepts_checksum_field() {
        let records = parse_tracefile("SF:/x.rs\nDA:2,5,abcdef\nend_of_record\n").unwrap();
        assert_eq!(records[0].hits.get(&2), Some(&5));
    }

    #[test]
    fn test_parse_tracefile_rejects_malformed_da() {
        let err = parse_tracefile("SF:/x.rs\nDA:two,5\n").unwrap_err();
        assert!(err.to_string().contains("malformed DA"));
    }

    #[test]
    fn test_parse_tracefile_rejects_huge_line_numbers() {
        let err = parse_tracefile("SF:/x.rs\nDA:18446744073709551615,1\nend_of_record\n")
            .unwrap_err();
        assert!(matches!(err, HeatlineError::Collector { .. }));
        assert!(err.to_string().contains("exceeds"));

        let at_limit = format!("SF:/x.rs\nDA:{MAX_LCOV_LINE},1\n");
        assert!(parse_tracefile(&at_limit).is_ok());
    }

    #[test]
    fn test_peek_with_huge_line_number_is_collector_error() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("lcov.info");
        std::fs::write(&trace, "SF:/gone/a.rs\nDA:18446744073709551615,1\nend_of_record\n")
            .unwrap();
        let err = LcovCollector::new(&trace).peek().unwrap_err();
        assert!(matches!(err, HeatlineError::Collector { .. }));
    }

    #[test]
    fn test_parse_tracefile_rejects_da_without_sf() {
        assert!(parse_tracefile("DA:1,1\n").is_err());
    }

    #[test]
    fn test_parse_tracefile_tolerates_negative_counts() {
        let records = parse_tracefile("SF:/x.rs\nDA:1,-1\n").unwrap();
        assert_eq!(records[0].hits.get(&1), Some(&0));
    }

    #[test]
    fn test_peek_sizes_lines_from_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app.rs");
        std::fs::write(&source, "fn main() {\n\n    run();\n}\n\n").unwrap();
        let trace = dir.path().join("lcov.info");
        std::fs::write(
            &trace,
            format!("SF:{}\nDA:1,2\nDA:3,2\nend_of_record\n", source.display()),
        )
        .unwrap();

        let collector = LcovCollector::new(&trace);
        let raw = collector.peek().unwrap();
        let lines = raw.get(&source.to_string_lossy()).unwrap();
        assert_eq!(
            lines,
            &[HitCount(2), NotExecutable, HitCount(2), NotExecutable, NotExecutable]
        );
    }

    #[test]
    fn test_peek_merges_duplicate_sections() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("lcov.info");
        std::fs::write(
            &trace,
            "TN:one\nSF:/gone/a.rs\nDA:2,1\nend_of_record\nTN:two\nSF:/gone/a.rs\nDA:2,4\nend_of_record\n",
        )
        .unwrap();
        let raw = LcovCollector::new(&trace).peek().unwrap();
        assert_eq!(raw.get("/gone/a.rs").unwrap(), &[NotExecutable, HitCount(5)]);
    }

    #[test]
    fn test_relative_sources_resolve_against_tracefile_dir() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("lcov.info");
        std::fs::write(&trace, "SF:src/lib.rs\nDA:1,1\nend_of_record\n").unwrap();
        let raw = LcovCollector::new(&trace).peek().unwrap();
        let expected = dir.path().join("src/lib.rs");
        assert!(raw.get(&expected.to_string_lossy()).is_some());
    }

    #[test]
    fn test_missing_tracefile_is_collector_error() {
        let err = LcovCollector::new("/definitely/not/here.info").peek().unwrap_err();
        assert!(matches!(err, HeatlineError::Collector { .. }));
    }

    #[test]
    fn test_clear_sets_zero_point() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("lcov.info");
        std::fs::write(&trace, "SF:/gone/a.rs\nDA:1,10\nDA:2,4\nend_of_record\n").unwrap();
        let collector = LcovCollector::new(&trace);
        collector.clear().unwrap();
        assert_eq!(
            collector.peek().unwrap().get("/gone/a.rs").unwrap(),
            &[HitCount(0), HitCount(0)]
        );

        std::fs::write(&trace, "SF:/gone/a.rs\nDA:1,13\nDA:2,4\nend_of_record\n").unwrap();
        assert_eq!(
            collector.peek().unwrap().get("/gone/a.rs").unwrap(),
            &[HitCount(3), HitCount(0)]
        );
    }

    #[test]
    fn test_zero_point_ignored_when_file_length_changes() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("lcov.info");
        std::fs::write(&trace, "SF:/gone/a.rs\nDA:1,10\nend_of_record\n").unwrap();
        let collector = LcovCollector::new(&trace);
        collector.clear().unwrap();

        std::fs::write(&trace, "SF:/gone/a.rs\nDA:1,12\nDA:2,1\nend_of_record\n").unwrap();
        assert_eq!(
            collector.peek().unwrap().get("/gone/a.rs").unwrap(),
            &[HitCount(12), HitCount(1)]
        );
    }

    #[test]
    fn test_line_count_follows_source_edits() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app.rs");
        std::fs::write(&source, "fn main() {\n}\n").unwrap();
        let trace = dir.path().join("lcov.info");
        std::fs::write(&trace, format!("SF:{}\nDA:1,1\nend_of_record\n", source.display()))
            .unwrap();
        let collector = LcovCollector::new(&trace);
        let key = source.to_string_lossy().into_owned();

        assert_eq!(collector.peek().unwrap().get(&key).unwrap().len(), 2);
        assert_eq!(collector.peek().unwrap().get(&key).unwrap().len(), 2);

        std::fs::write(&source, "fn main() {\n    run();\n    stop();\n    done();\n}\n").unwrap();
        assert_eq!(collector.peek().unwrap().get(&key).unwrap().len(), 5);

        std::fs::remove_file(&source).unwrap();
        assert_eq!(collector.peek().unwrap().get(&key).unwrap(), &[HitCount(1)]);
    }
}
