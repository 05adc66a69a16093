use std::path::PathBuf;

use crate::engine::{run, EngineOptions, SymlinkPolicy, WalkConfig};
use crate::entry::Visit;
use crate::error::FindError;
use crate::parser::parse;
use crate::registry::PredicateRegistry;
use crate::results::Results;
use crate::token::tokenize;

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a search.
///
/// Created via [`pathfind::search()`](crate::search). Configure with chained
/// builder methods, then call [`run()`](SearchBuilder::run) to execute.
///
/// # Example
///
/// ```rust,ignore
/// let registry = PredicateRegistry::with_builtins()?;
/// let results = pathfind::search(&registry)
///     .root(".")
///     .expression(["-name", "*.rs", "-o", "-name", "*.toml"])
///     .symlinks(SymlinkPolicy::FollowFromCommandLine)
///     .collect_paths(true)
///     .run()?;
/// ```
pub struct SearchBuilder<'a> {
    registry:       &'a PredicateRegistry,
    roots:          Vec<PathBuf>,
    expression:     Vec<String>,
    symlinks:       SymlinkPolicy,
    visitor:        Option<Box<dyn FnMut(&Visit) -> Result<(), FindError> + 'a>>,
    collect_paths:  bool,
    collect_errors: bool,
}

impl<'a> SearchBuilder<'a> {
    pub(crate) fn new(registry: &'a PredicateRegistry) -> Self {
        Self {
            registry,
            roots:          Vec::new(),
            expression:     Vec::new(),
            symlinks:       SymlinkPolicy::default(),
            visitor:        None,
            collect_paths:  false,
            collect_errors: false,
        }
    }

    // ── Roots ─────────────────────────────────────────────────────────────

    /// Add a root path. Roots are walked in the order they are added.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    /// Add several root paths.
    pub fn roots<P: Into<PathBuf>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.roots.extend(paths.into_iter().map(Into::into));
        self
    }

    // ── Expression ────────────────────────────────────────────────────────

    /// Set the expression as raw command-line arguments,
    /// e.g. `["!", "-name", "*.o", "-a", "-type", "f"]`.
    ///
    /// An empty expression matches every file.
    pub fn expression<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.expression = args.into_iter().map(Into::into).collect();
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// When symbolic links are dereferenced. Defaults to
    /// [`SymlinkPolicy::NeverFollow`].
    pub fn symlinks(mut self, policy: SymlinkPolicy) -> Self {
        self.symlinks = policy;
        self
    }

    /// Call `f` for every entry taken off the work list, in visitation order,
    /// including directories and skipped entries.
    pub fn on_visit(self, mut f: impl FnMut(&Visit) + 'a) -> Self {
        self.try_on_visit(move |visit| {
            f(visit);
            Ok(())
        })
    }

    /// Like [`on_visit`](SearchBuilder::on_visit), but the first `Err` stops
    /// the walk and becomes the result of [`run()`](SearchBuilder::run).
    pub fn try_on_visit(mut self, f: impl FnMut(&Visit) -> Result<(), FindError> + 'a) -> Self {
        self.visitor = Some(Box::new(f));
        self
    }

    /// Collect matched paths into [`Results::paths`].
    ///
    /// Disabled by default; the match count is always kept.
    pub fn collect_paths(mut self, yes: bool) -> Self {
        self.collect_paths = yes;
        self
    }

    /// Collect non-fatal errors into [`Results::errors`].
    ///
    /// Disabled by default. When enabled, skipped entries (permission denied,
    /// broken links, symlink loops) are stored rather than only counted.
    pub fn collect_errors(mut self, yes: bool) -> Self {
        self.collect_errors = yes;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Parse the expression, then walk every root.
    ///
    /// # Errors
    ///
    /// [`FindError::Usage`] if no root was given, or any parse error
    /// (including unknown predicates). Both are raised before the
    /// filesystem is touched. Per-entry filesystem errors never fail the
    /// run; see [`Results::errors`]. An error from a
    /// [`try_on_visit`](SearchBuilder::try_on_visit) callback is returned as is.
    pub fn run(self) -> Result<Results, FindError> {
        if self.roots.is_empty() {
            return Err(FindError::Usage("missing root path".into()));
        }

        let tokens = tokenize(&self.expression);
        let tree = if tokens.is_empty() {
            None
        } else {
            Some(parse(&tokens, self.registry)?)
        };
        if let Some(tree) = &tree {
            tracing::debug!(expression = %tree, primaries = tree.primaries(), "parsed expression");
        }

        run(EngineOptions {
            config: WalkConfig {
                symlinks: self.symlinks,
            },
            roots: self.roots,
            tree,
            registry: self.registry,
            visitor: self.visitor,
            collect_paths: self.collect_paths,
            collect_errors: self.collect_errors,
        })
    }
}
