use std::path::PathBuf;
use std::time::Duration;

use crate::error::FindError;

/// The output of a completed search.
///
/// `paths` and `errors` are both opt-in. Enable them on the builder:
/// `.collect_paths(true)` and `.collect_errors(true)`.
#[derive(Debug)]
pub struct Results {
    /// Number of files the expression accepted.
    pub matches: usize,

    /// Matched paths in visitation order.
    /// Only populated if `.collect_paths(true)` was set on the builder.
    pub paths: Vec<PathBuf>,

    /// Scan statistics.
    pub stats: ScanStats,

    /// Entries skipped because of filesystem errors (permission denied,
    /// broken links, symlink loops, entries that vanished mid-walk).
    /// Only populated if `.collect_errors(true)` was set on the builder.
    pub errors: Vec<FindError>,
}

/// Statistics for a completed scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStats {
    /// Leaves evaluated against the expression (matched or not).
    pub files: usize,

    /// Directories expanded.
    pub dirs: usize,

    /// Entries dropped because of a filesystem error.
    pub skipped: usize,

    /// Wall-clock time from search start to completion.
    pub duration: Duration,
}

impl ScanStats {
    /// Total entries taken off the work list.
    pub fn visited(&self) -> usize {
        self.files + self.dirs + self.skipped
    }
}
