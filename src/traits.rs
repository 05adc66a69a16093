use std::path::Path;

/// A named boolean test over a candidate path and its string arguments.
///
/// Implement this to add new operand types (size, age, permissions, ...)
/// without touching the parser or the evaluator. Register implementations
/// with [`PredicateRegistry::register`](crate::PredicateRegistry::register)
/// before the first parse.
///
/// Any `Fn(&Path, &[String]) -> bool` closure is a predicate.
///
/// # Thread Safety
///
/// `Send + Sync` are required so a fully built registry can be shared.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use pathfind::Predicate;
///
/// struct Extension;
///
/// impl Predicate for Extension {
///     fn test(&self, path: &Path, args: &[String]) -> bool {
///         path.extension()
///             .map(|e| args.iter().any(|a| e.eq_ignore_ascii_case(a.as_str())))
///             .unwrap_or(false)
///     }
/// }
/// ```
pub trait Predicate: Send + Sync {
    /// Returns `true` if `path` satisfies this predicate.
    fn test(&self, path: &Path, args: &[String]) -> bool;

    /// Validate the argument list when the expression is parsed.
    ///
    /// The error string becomes the explanation of a parse error, so a
    /// malformed argument aborts the run before any file is visited.
    fn check(&self, _args: &[String]) -> Result<(), String> {
        Ok(())
    }
}

impl<F> Predicate for F
where
    F: Fn(&Path, &[String]) -> bool + Send + Sync,
{
    fn test(&self, path: &Path, args: &[String]) -> bool {
        self(path, args)
    }
}

/// Environment variables passed to a [`Command`].
pub type Environment = std::collections::HashMap<String, String>;

/// A utility callable under a string name through
/// [`CommandTable`](crate::CommandTable).
///
/// Receives its arguments (without the command name), the environment, and
/// the input and output streams; returns the process exit code.
pub trait Command {
    fn run(
        &self,
        args: &[String],
        env: &Environment,
        input: &mut dyn std::io::Read,
        output: &mut dyn std::io::Write,
    ) -> i32;
}

impl<F> Command for F
where
    F: Fn(&[String], &Environment, &mut dyn std::io::Read, &mut dyn std::io::Write) -> i32,
{
    fn run(
        &self,
        args: &[String],
        env: &Environment,
        input: &mut dyn std::io::Read,
        output: &mut dyn std::io::Write,
    ) -> i32 {
        self(args, env, input, output)
    }
}
