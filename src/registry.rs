use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use glob::{MatchOptions, Pattern};

use crate::error::FindError;
use crate::traits::Predicate;

// ---------------------------------------------------------------------------
// PredicateRegistry
// ---------------------------------------------------------------------------

/// Mapping from operand name to [`Predicate`].
///
/// Built once at startup, then shared by reference with every parse and
/// evaluation. Registration is append-only: a second registration under
/// the same name is a configuration error.
#[derive(Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Arc<dyn Predicate>>,
}

impl PredicateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in predicates:
    /// `name`, `iname`, `path`, `type`, `true` and `false`.
    pub fn with_builtins() -> Result<Self, FindError> {
        let mut registry = Self::new();
        registry.register("name", GlobPredicate::base_name(false))?;
        registry.register("iname", GlobPredicate::base_name(true))?;
        registry.register("path", GlobPredicate::whole_path())?;
        registry.register("type", TypePredicate)?;
        registry.register("true", Constant(true))?;
        registry.register("false", Constant(false))?;
        Ok(registry)
    }

    /// Add `predicate` under `name`.
    ///
    /// # Errors
    ///
    /// [`FindError::DuplicatePredicate`] if `name` is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        predicate: impl Predicate + 'static,
    ) -> Result<(), FindError> {
        let name = name.into();
        if self.predicates.contains_key(&name) {
            return Err(FindError::DuplicatePredicate(name));
        }
        tracing::debug!(predicate = %name, "registered predicate");
        self.predicates.insert(name, Arc::new(predicate));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Predicate> {
        self.predicates.get(name).map(|p| p.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicates", &self.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in predicates
// ---------------------------------------------------------------------------

/// Shell glob over the base name (`-name`, `-iname`) or the whole path (`-path`).
///
/// Patterns are compiled once, when `check` runs at parse time, and looked
/// up by their source text for every evaluated path.
struct GlobPredicate {
    whole_path: bool,
    options: MatchOptions,
    compiled: RwLock<HashMap<String, Pattern>>,
}

impl GlobPredicate {
    fn base_name(case_insensitive: bool) -> Self {
        Self {
            whole_path: false,
            options: MatchOptions {
                case_sensitive: !case_insensitive,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            },
            compiled: RwLock::default(),
        }
    }

    fn whole_path() -> Self {
        Self {
            whole_path: true,
            options: MatchOptions::new(),
            compiled: RwLock::default(),
        }
    }

    fn compile(&self, source: &str) -> Result<Pattern, glob::PatternError> {
        if let Some(pattern) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
        {
            return Ok(pattern.clone());
        }
        let pattern = Pattern::new(source)?;
        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.to_string(), pattern.clone());
        Ok(pattern)
    }

    fn matches(&self, source: &str, subject: &str) -> bool {
        let cache = self.compiled.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(pattern) = cache.get(source) {
            return pattern.matches_with(subject, self.options);
        }
        drop(cache);
        self.compile(source)
            .map(|pattern| pattern.matches_with(subject, self.options))
            .unwrap_or(false)
    }
}

impl Predicate for GlobPredicate {
    fn test(&self, path: &Path, args: &[String]) -> bool {
        let Some(source) = args.first() else {
            return false;
        };
        let subject = if self.whole_path {
            path.to_string_lossy()
        } else {
            match path.file_name() {
                Some(name) => name.to_string_lossy(),
                None => path.to_string_lossy(),
            }
        };
        self.matches(source, &subject)
    }

    fn check(&self, args: &[String]) -> Result<(), String> {
        match args {
            [pattern] => self
                .compile(pattern)
                .map(|_| ())
                .map_err(|e| format!("invalid pattern {pattern:?}: {}", e.msg)),
            _ => Err(format!("expects one pattern, got {} arguments", args.len())),
        }
    }
}

/// `-type f|d|l`, judged on the entry itself without following links.
struct TypePredicate;

impl Predicate for TypePredicate {
    fn test(&self, path: &Path, args: &[String]) -> bool {
        let Ok(meta) = std::fs::symlink_metadata(path) else {
            return false;
        };
        let ft = meta.file_type();
        match args.first().map(String::as_str) {
            Some("f") => ft.is_file(),
            Some("d") => ft.is_dir(),
            Some("l") => ft.is_symlink(),
            _ => false,
        }
    }

    fn check(&self, args: &[String]) -> Result<(), String> {
        match args {
            [kind] if matches!(kind.as_str(), "f" | "d" | "l") => Ok(()),
            [kind] => Err(format!("unknown file type {kind:?}, expected f, d or l")),
            _ => Err(format!("expects one file type, got {} arguments", args.len())),
        }
    }
}

/// `-true` / `-false`.
struct Constant(bool);

impl Predicate for Constant {
    fn test(&self, _path: &Path, _args: &[String]) -> bool {
        self.0
    }

    fn check(&self, args: &[String]) -> Result<(), String> {
        if args.is_empty() {
            Ok(())
        } else {
            Err("takes no arguments".to_string())
        }
    }
}
