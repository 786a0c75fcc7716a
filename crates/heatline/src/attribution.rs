//! Line Attribution
//!
//! Spreads the count a call reports on its name line over every line its
//! argument list occupies. Ranges are merged with `max`, never summed, so
//! overlapping and nested calls can be applied in any order.

use crate::scan::CallRange;
use crate::snapshot::LineRecord;

/// Per-file effective counts after attribution, same length as the input
pub type AttributedLines = Vec<LineRecord>;

/// Apply call ranges to raw line records
///
/// The count spread by a range is always read from `lines`, not from the
/// partially attributed result. A range whose start line is not
/// executable (or lies outside the file) is skipped. Range ends past the
/// last line are clamped.
#[must_use]
pub fn attribute(lines: &[LineRecord], ranges: &[CallRange]) -> AttributedLines {
    let mut attributed = lines.to_vec();
    for range in ranges {
        let Some(observed) = range
            .start_line
            .checked_sub(1)
            .and_then(|idx| lines.get(idx))
            .and_then(|record| record.count())
        else {
            continue;
        };
        let first = range.start_line - 1;
        let last = range.end_line.min(lines.len());
        for slot in attributed.iter_mut().take(last).skip(first) {
            *slot = match *slot {
                LineRecord::NotExecutable => LineRecord::HitCount(observed),
                LineRecord::HitCount(current) => LineRecord::HitCount(current.max(observed)),
            };
        }
    }
    attributed
}

/// Largest effective count in a file, `None` if nothing is executable
#[must_use]
pub fn max_count(lines: &[LineRecord]) -> Option<u64> {
    lines.iter().filter_map(|record| record.count()).max()
}
