//! Run accounting.
//!
//! Per-file outcomes are folded into a [`RunSummary`]; parallel runs merge
//! partial summaries instead of sharing counters.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Number of references rewritten
    pub replacements: u64,
    /// Content changed and was written back
    pub changed: bool,
    /// Not UTF-8, left untouched
    pub binary: bool,
}

impl FileOutcome {
    pub fn binary(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            replacements: 0,
            changed: false,
            binary: true,
        }
    }
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_scanned: u64,
    pub files_changed: u64,
    pub replacements: u64,
    pub binary_skipped: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one processed file
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.files_scanned += 1;
        self.replacements += outcome.replacements;
        if outcome.changed {
            self.files_changed += 1;
        }
        if outcome.binary {
            self.binary_skipped += 1;
        }
    }

    /// Combine two partial summaries
    pub fn merge(self, other: Self) -> Self {
        Self {
            files_scanned: self.files_scanned + other.files_scanned,
            files_changed: self.files_changed + other.files_changed,
            replacements: self.replacements + other.replacements,
            binary_skipped: self.binary_skipped + other.binary_skipped,
            elapsed: self.elapsed.max(other.elapsed),
        }
    }

    /// Stamp the final elapsed time
    pub fn finish(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Updated {} file(s), {} replacement(s) in {:.2}s",
            self.files_changed,
            self.replacements,
            self.elapsed.as_secs_f64()
        )
    }
}
