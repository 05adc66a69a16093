use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use crate::ast::Or;
use crate::entry::{Outcome, Visit, VisitKind};
use crate::error::FindError;
use crate::eval::evaluate;
use crate::registry::PredicateRegistry;
use crate::results::{Results, ScanStats};

// ---------------------------------------------------------------------------
// SymlinkPolicy
// ---------------------------------------------------------------------------

/// When the traversal dereferences symbolic links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymlinkPolicy {
    /// `-P`: links are leaves.
    #[default]
    NeverFollow,

    /// `-L`: every link is dereferenced.
    AlwaysFollow,

    /// `-H`: only links given as root paths are dereferenced.
    FollowFromCommandLine,
}

impl SymlinkPolicy {
    /// Whether a link found at a root (`is_root`) or during expansion is dereferenced.
    pub fn follows(self, is_root: bool) -> bool {
        match self {
            Self::NeverFollow => false,
            Self::AlwaysFollow => true,
            Self::FollowFromCommandLine => is_root,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Traversal parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkConfig {
    pub symlinks: SymlinkPolicy,
}

/// Internal options passed from the builder to `run()`.
pub(crate) struct EngineOptions<'a> {
    pub config: WalkConfig,
    pub roots: Vec<PathBuf>,
    /// `None` accepts every leaf.
    pub tree: Option<Or>,
    pub registry: &'a PredicateRegistry,
    /// An `Err` stops the walk and is returned from `run()`.
    pub visitor: Option<Box<dyn FnMut(&Visit) -> Result<(), FindError> + 'a>>,
    pub collect_paths: bool,
    pub collect_errors: bool,
}

/// An entry waiting on the work list.
struct Pending {
    path: PathBuf,
    depth: usize,
    /// Canonical paths of the directories above this entry, shared by all
    /// siblings. Tracked only under `AlwaysFollow`, the one policy that can
    /// walk into a cycle.
    ancestors: Rc<[PathBuf]>,
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Walk every root breadth-first with an explicit FIFO work list and
/// evaluate each leaf against the expression.
///
/// Filesystem errors on individual entries are recorded and skipped.
///
/// # Errors
///
/// Evaluation errors (an unresolvable predicate in a hand-built tree) and
/// errors returned by the visitor abort the walk.
pub(crate) fn run(mut opts: EngineOptions<'_>) -> Result<Results, FindError> {
    let start = Instant::now();
    let policy = opts.config.symlinks;

    let top: Rc<[PathBuf]> = Rc::from(Vec::new());
    let mut work: VecDeque<Pending> = opts
        .roots
        .drain(..)
        .map(|path| Pending {
            path,
            depth: 0,
            ancestors: Rc::clone(&top),
        })
        .collect();

    let mut tally = Tally {
        opts: &mut opts,
        stats: ScanStats::default(),
        matches: 0,
        paths: Vec::new(),
        errors: Vec::new(),
    };

    while let Some(item) = work.pop_front() {
        let is_root = item.depth == 0;

        match classify(&item.path, policy.follows(is_root)) {
            Err(err) => tally.record(skipped(item, VisitKind::Unknown, err))?,
            Ok(VisitKind::Dir) => match expand(&item, policy) {
                Ok((children, failures)) => {
                    let visit = Visit {
                        path: item.path,
                        kind: VisitKind::Dir,
                        depth: item.depth,
                        outcome: Outcome::Expanded { children: children.len() },
                    };
                    work.extend(children);
                    tally.record(visit)?;
                    for err in failures {
                        let path = err.path().cloned().unwrap_or_default();
                        tally.record(Visit {
                            path,
                            kind: VisitKind::Unknown,
                            depth: item.depth + 1,
                            outcome: Outcome::Skipped(err),
                        })?;
                    }
                }
                Err(err) => tally.record(skipped(item, VisitKind::Dir, err))?,
            },
            Ok(kind) => {
                let matched = match &tally.opts.tree {
                    Some(tree) => evaluate(tree, &item.path, tally.opts.registry)?,
                    None => true,
                };
                tally.record(Visit {
                    path: item.path,
                    kind,
                    depth: item.depth,
                    outcome: Outcome::Evaluated { matched },
                })?;
            }
        }
    }

    let Tally {
        mut stats,
        matches,
        paths,
        errors,
        ..
    } = tally;
    stats.duration = start.elapsed();
    tracing::info!(
        matches,
        visited = stats.visited(),
        files = stats.files,
        dirs = stats.dirs,
        skipped = stats.skipped,
        "search finished"
    );

    Ok(Results {
        matches,
        paths,
        stats,
        errors,
    })
}

/// Running totals; every visit passes through `record` exactly once.
struct Tally<'o, 'a> {
    opts: &'o mut EngineOptions<'a>,
    stats: ScanStats,
    matches: usize,
    paths: Vec<PathBuf>,
    errors: Vec<FindError>,
}

impl Tally<'_, '_> {
    fn record(&mut self, visit: Visit) -> Result<(), FindError> {
        tracing::debug!(path = %visit.path.display(), kind = ?visit.kind, "visited");

        if let Some(visitor) = self.opts.visitor.as_mut() {
            visitor(&visit)?;
        }

        match visit.outcome {
            Outcome::Expanded { .. } => self.stats.dirs += 1,
            Outcome::Evaluated { matched } => {
                self.stats.files += 1;
                if matched {
                    self.matches += 1;
                    if self.opts.collect_paths {
                        self.paths.push(visit.path);
                    }
                }
            }
            Outcome::Skipped(err) => {
                tracing::debug!(path = %visit.path.display(), error = %err, "skipped entry");
                self.stats.skipped += 1;
                if self.opts.collect_errors {
                    self.errors.push(err);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Classify `path`, dereferencing it only if it is a link and `follow` is set.
/// A followed link whose target is missing fails with `NotFound`.
fn classify(path: &Path, follow: bool) -> Result<VisitKind, FindError> {
    let meta = fs::symlink_metadata(path).map_err(|e| FindError::from_io(path.to_path_buf(), e))?;
    let ft = meta.file_type();
    if ft.is_symlink() && follow {
        let target = fs::metadata(path).map_err(|e| FindError::from_io(path.to_path_buf(), e))?;
        return Ok(VisitKind::from_file_type(target.file_type()));
    }
    Ok(VisitKind::from_file_type(ft))
}

/// List the children of a directory as new work items, in enumeration order.
///
/// Children that fail mid-enumeration come back as errors alongside the
/// listing; only failing to open the directory fails the whole call.
fn expand(item: &Pending, policy: SymlinkPolicy) -> Result<(Vec<Pending>, Vec<FindError>), FindError> {
    let io_err = |e| FindError::from_io(item.path.clone(), e);

    let ancestors = if policy == SymlinkPolicy::AlwaysFollow {
        let canonical = fs::canonicalize(&item.path).map_err(io_err)?;
        if item.ancestors.contains(&canonical) {
            return Err(FindError::SymlinkLoop(item.path.clone()));
        }
        let mut chain = Vec::with_capacity(item.ancestors.len() + 1);
        chain.extend(item.ancestors.iter().cloned());
        chain.push(canonical);
        Rc::from(chain)
    } else {
        Rc::clone(&item.ancestors)
    };

    let mut children = Vec::new();
    let mut failures = Vec::new();
    for entry in fs::read_dir(&item.path).map_err(io_err)? {
        match entry {
            Ok(entry) => children.push(Pending {
                path: entry.path(),
                depth: item.depth + 1,
                ancestors: Rc::clone(&ancestors),
            }),
            Err(e) => failures.push(io_err(e)),
        }
    }
    Ok((children, failures))
}

fn skipped(item: Pending, kind: VisitKind, err: FindError) -> Visit {
    Visit {
        path: item.path,
        kind,
        depth: item.depth,
        outcome: Outcome::Skipped(err),
    }
}
