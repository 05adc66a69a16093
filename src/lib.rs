//! # pathfind
//!
//! A minimal `find`: walk directory trees and keep the files that satisfy a
//! boolean expression of named predicates.
//!
//! ```text
//! find [-H|-L|-P] [-v] <root-path>... [expression]
//! ```
//!
//! The expression uses `( )` for grouping, `!` for negation, `-a` (or plain
//! adjacency) for conjunction and `-o` for disjunction, with the usual
//! precedence `!` > `-a` > `-o`. Every other `-word` names a predicate from
//! the [`PredicateRegistry`], followed by its arguments, e.g. `-name *.txt`.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pathfind::{PredicateRegistry, SymlinkPolicy};
//!
//! let registry = PredicateRegistry::with_builtins().unwrap();
//! let results = pathfind::search(&registry)
//!     .root(".")
//!     .expression(["-name", "*.rs", "!", "-path", "*/target/*"])
//!     .symlinks(SymlinkPolicy::NeverFollow)
//!     .collect_paths(true)
//!     .run()
//!     .unwrap();
//!
//! for path in &results.paths {
//!     println!("{}", path.display());
//! }
//! ```
//!
//! # Custom Predicates
//!
//! Register anything implementing [`Predicate`], including plain closures,
//! before parsing:
//!
//! ```rust
//! use std::path::Path;
//! use pathfind::PredicateRegistry;
//!
//! let mut registry = PredicateRegistry::with_builtins().unwrap();
//! registry
//!     .register("ext", |path: &Path, args: &[String]| {
//!         path.extension()
//!             .map(|e| args.iter().any(|a| e == a.as_str()))
//!             .unwrap_or(false)
//!     })
//!     .unwrap();
//!
//! assert!(registry.register("ext", |_: &Path, _: &[String]| true).is_err());
//! ```

#![forbid(unsafe_code)]

pub mod ast;
pub mod engine;
pub mod parser;
pub mod token;

mod builder;
mod command;
mod entry;
mod error;
mod eval;
mod registry;
mod results;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::SearchBuilder;
pub use command::{CommandTable, FindCommand};
pub use engine::SymlinkPolicy;
pub use entry::{Outcome, Visit, VisitKind};
pub use error::FindError;
pub use eval::evaluate;
pub use registry::PredicateRegistry;
pub use results::{Results, ScanStats};
pub use traits::{Command, Environment, Predicate};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] that resolves predicates in `registry`.
///
/// # Example
///
/// ```rust
/// use pathfind::PredicateRegistry;
///
/// let registry = PredicateRegistry::with_builtins().unwrap();
/// let dir = std::env::temp_dir();
/// let err = pathfind::search(&registry)
///     .root(dir)
///     .expression(["-bogus"])
///     .run()
///     .unwrap_err();
///
/// assert!(err.is_parse_error());
/// ```
pub fn search(registry: &PredicateRegistry) -> SearchBuilder<'_> {
    SearchBuilder::new(registry)
}
