//! Coverage Snapshots
//!
//! A [`RawSnapshot`] is what a collector reports for the whole process:
//! absolute path to one [`LineRecord`] per source line. A
//! [`ProjectSnapshot`] is the same data restricted to the project root,
//! keyed by project-relative path, with excluded files removed.

use crate::result::HeatlineResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Coverage state of a single source line
///
/// Serializes as `null` for [`LineRecord::NotExecutable`] and as a bare
/// integer for [`LineRecord::HitCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum LineRecord {
    /// Blank line, comment, or anything else the counter never instruments
    NotExecutable,
    /// Number of times the line executed
    HitCount(u64),
}

impl LineRecord {
    /// Hit count, if the line is executable
    #[must_use]
    pub const fn count(self) -> Option<u64> {
        match self {
            Self::NotExecutable => None,
            Self::HitCount(n) => Some(n),
        }
    }

    /// Hit count, treating non-executable lines as zero
    #[must_use]
    pub const fn count_or_zero(self) -> u64 {
        match self {
            Self::NotExecutable => 0,
            Self::HitCount(n) => n,
        }
    }

    /// Check if the line is executable
    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(self, Self::HitCount(_))
    }
}

impl From<Option<u64>> for LineRecord {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::NotExecutable, Self::HitCount)
    }
}

impl From<LineRecord> for Option<u64> {
    fn from(record: LineRecord) -> Self {
        record.count()
    }
}

/// Sum of all executable counts in a line sequence
#[must_use]
pub fn total_hits(lines: &[LineRecord]) -> u64 {
    lines
        .iter()
        .filter_map(|record| record.count())
        .fold(0u64, u64::saturating_add)
}

/// Process-wide coverage keyed by absolute path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSnapshot {
    files: BTreeMap<String, Vec<LineRecord>>,
}

impl RawSnapshot {
    /// Create an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the line records of a file
    pub fn insert(&mut self, path: impl Into<String>, lines: Vec<LineRecord>) {
        let _ = self.files.insert(path.into(), lines);
    }

    /// Line records of a file
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[LineRecord]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Iterate files in path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<LineRecord>)> {
        self.files.iter()
    }

    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<(String, Vec<LineRecord>)> for RawSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Vec<LineRecord>)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RawSnapshot {
    type Item = (String, Vec<LineRecord>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<LineRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Project coverage keyed by project-relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSnapshot {
    files: BTreeMap<String, Vec<LineRecord>>,
}

impl ProjectSnapshot {
    /// Create an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the line records of a file
    pub fn insert(&mut self, path: impl Into<String>, lines: Vec<LineRecord>) {
        let _ = self.files.insert(path.into(), lines);
    }

    /// Line records of a file
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[LineRecord]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Check if a file has a coverage entry
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Iterate files in path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<LineRecord>)> {
        self.files.iter()
    }

    /// Project-relative paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consume into the underlying map
    #[must_use]
    pub fn into_files(self) -> BTreeMap<String, Vec<LineRecord>> {
        self.files
    }
}

impl FromIterator<(String, Vec<LineRecord>)> for ProjectSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Vec<LineRecord>)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Absolute paths removed from every project snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    paths: HashSet<String>,
}

impl ExclusionSet {
    /// Create an empty exclusion set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already expanded absolute paths
    #[must_use]
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand glob patterns into absolute paths
    ///
    /// Relative patterns are resolved against `root`. Expansion happens
    /// once; files created afterwards are not excluded.
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is not a valid glob
    pub fn expand(root: &Path, patterns: &[String]) -> HeatlineResult<Self> {
        let mut paths = HashSet::new();
        for pattern in patterns {
            let absolute = if Path::new(pattern).is_absolute() {
                pattern.clone()
            } else {
                root.join(pattern).to_string_lossy().into_owned()
            };
            for entry in glob::glob(&absolute)? {
                match entry {
                    Ok(path) => {
                        let _ = paths.insert(path.to_string_lossy().into_owned());
                    }
                    Err(e) => tracing::debug!(pattern = %absolute, error = %e, "skipping unreadable glob match"),
                }
            }
        }
        tracing::debug!(excluded = paths.len(), "expanded exclusion patterns");
        Ok(Self { paths })
    }

    /// Check if an absolute path is excluded
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Number of excluded paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing is excluded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Restricts raw snapshots to one project
#[derive(Debug, Clone)]
pub struct SnapshotFilter {
    project_root: String,
    exclusions: ExclusionSet,
}

impl SnapshotFilter {
    /// Create a filter for a project root
    ///
    /// The root is normalized to end with `/` so that `/app` never
    /// matches `/application/...`.
    #[must_use]
    pub fn new(project_root: &str, exclusions: ExclusionSet) -> Self {
        Self {
            project_root: normalize_root(project_root),
            exclusions,
        }
    }

    /// Normalized project root, always ending with `/`
    #[must_use]
    pub fn project_root(&self) -> &str {
        &self.project_root
    }

    /// Exclusion set applied by this filter
    #[must_use]
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Restrict a raw snapshot to project files
    #[must_use]
    pub fn apply(&self, raw: RawSnapshot) -> ProjectSnapshot {
        filter(raw, &self.project_root, &self.exclusions)
    }
}

/// Restrict `raw` to paths under `project_root` minus `exclusions`
#[must_use]
pub fn filter(raw: RawSnapshot, project_root: &str, exclusions: &ExclusionSet) -> ProjectSnapshot {
    let root = normalize_root(project_root);
    raw.into_iter()
        .filter(|(path, _)| !exclusions.contains(path))
        .filter_map(|(path, lines)| {
            path.strip_prefix(&root)
                .map(|relative| (relative.to_string(), lines))
        })
        .collect()
}

fn normalize_root(root: &str) -> String {
    if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{root}/")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use LineRecord::{HitCount, NotExecutable};

    fn raw() -> RawSnapshot {
        [
            ("/srv/app/app.rs".to_string(), vec![NotExecutable, HitCount(3)]),
            ("/srv/app/lib/user.rs".to_string(), vec![HitCount(1)]),
            ("/srv/application/main.rs".to_string(), vec![HitCount(9)]),
            ("/usr/lib/std.rs".to_string(), vec![HitCount(100)]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_line_record_serializes_as_nullable_integer() {
        let lines = vec![NotExecutable, HitCount(0), HitCount(7)];
        let json = serde_json::to_string(&lines).unwrap();
        assert_eq!(json, "[null,0,7]");
        let back: Vec<LineRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lines);
    }

    #[test]
    fn test_total_hits_skips_not_executable() {
        assert_eq!(total_hits(&[NotExecutable, HitCount(2), HitCount(3)]), 5);
        assert_eq!(total_hits(&[NotExecutable]), 0);
        assert_eq!(total_hits(&[]), 0);
    }

    #[test]
    fn test_filter_keeps_project_files_and_strips_root() {
        let project = filter(raw(), "/srv/app", &ExclusionSet::new());
        let paths: Vec<&str> = project.paths().collect();
        assert_eq!(paths, vec!["app.rs", "lib/user.rs"]);
        assert_eq!(project.get("app.rs"), Some(&[NotExecutable, HitCount(3)][..]));
    }

    #[test]
    fn test_filter_root_with_trailing_slash() {
        let a = filter(raw(), "/srv/app/", &ExclusionSet::new());
        let b = filter(raw(), "/srv/app", &ExclusionSet::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_filter_does_not_match_sibling_prefix() {
        let project = filter(raw(), "/srv/app", &ExclusionSet::new());
        assert!(!project.contains("lication/main.rs"));
        assert!(!project.contains("/srv/application/main.rs"));
    }

    #[test]
    fn test_filter_removes_excluded_paths() {
        let exclusions = ExclusionSet::from_paths(["/srv/app/lib/user.rs"]);
        let project = filter(raw(), "/srv/app", &exclusions);
        assert_eq!(project.len(), 1);
        assert!(project.contains("app.rs"));
    }

    #[test]
    fn test_snapshot_filter_matches_free_function() {
        let exclusions = ExclusionSet::from_paths(["/srv/app/app.rs"]);
        let filter_struct = SnapshotFilter::new("/srv/app", exclusions.clone());
        assert_eq!(filter_struct.project_root(), "/srv/app/");
        assert_eq!(
            filter_struct.apply(raw()),
            filter(raw(), "/srv/app", &exclusions)
        );
    }

    #[test]
    fn test_exclusion_set_expands_globs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("vendor")).unwrap();
        std::fs::write(dir.path().join("vendor/a.rs"), "").unwrap();
        std::fs::write(dir.path().join("vendor/b.rs"), "").unwrap();
        std::fs::write(dir.path().join("main.rs"), "").unwrap();

        let set = ExclusionSet::expand(dir.path(), &["vendor/*.rs".to_string()]).unwrap();
        assert_eq!(set.len(), 2);
        let a = dir.path().join("vendor/a.rs");
        assert!(set.contains(&a.to_string_lossy()));
        assert!(!set.contains(&dir.path().join("main.rs").to_string_lossy()));
    }

    #[test]
    fn test_exclusion_set_rejects_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExclusionSet::expand(dir.path(), &["[".to_string()]);
        assert!(result.is_err());
    }
}
