use std::fmt;
use std::fs::FileType;
use std::path::PathBuf;

use crate::error::FindError;

/// One entry taken off the work list, after classification.
///
/// Handed to the visitor installed with
/// [`SearchBuilder::on_visit`](crate::SearchBuilder::on_visit) in
/// visitation order. Its `Display` form is the `-v` diagnostic line.
#[derive(Debug)]
pub struct Visit {
    /// Path as discovered: a root as given, or `parent.join(name)`.
    pub path: PathBuf,

    /// Classification after applying the symlink policy.
    pub kind: VisitKind,

    /// Distance from the root this entry was found under. Roots are 0.
    pub depth: usize,

    /// What the engine did with the entry.
    pub outcome: Outcome,
}

/// The kind of a traversed entry.
///
/// A followed symlink takes the kind of its target. `Symlink` is only
/// reported for links the policy declined to follow; those are leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKind {
    /// A directory, expanded and never evaluated.
    Dir,

    /// A regular file.
    File,

    /// A symbolic link that was not dereferenced.
    Symlink,

    /// Anything else (device files, pipes, sockets, etc.). Evaluated like a file.
    Other,

    /// Could not be classified; see [`Outcome::Skipped`].
    Unknown,
}

impl VisitKind {
    pub(crate) fn from_file_type(ft: FileType) -> Self {
        if ft.is_dir() {
            Self::Dir
        } else if ft.is_file() {
            Self::File
        } else if ft.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::File => "file",
            Self::Symlink => "link",
            Self::Other => "other",
            Self::Unknown => "entry",
        }
    }
}

/// Result of visiting one entry.
#[derive(Debug)]
pub enum Outcome {
    /// A directory whose children were pushed onto the work list.
    Expanded { children: usize },

    /// A leaf evaluated against the expression.
    Evaluated { matched: bool },

    /// A recoverable filesystem error; the entry was dropped.
    Skipped(FindError),
}

impl Visit {
    pub fn is_match(&self) -> bool {
        matches!(self.outcome, Outcome::Evaluated { matched: true })
    }
}

impl fmt::Display for Visit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.outcome {
            Outcome::Expanded { children } => write!(f, "dir {path}: {children} entries"),
            Outcome::Evaluated { matched } => write!(f, "{} {path}: {matched}", self.kind.label()),
            Outcome::Skipped(err) => write!(f, "skip {} {path}: {err}", self.kind.label()),
        }
    }
}
