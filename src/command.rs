use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

use clap::error::ErrorKind;
use clap::Parser;

use crate::builder::SearchBuilder;
use crate::engine::SymlinkPolicy;
use crate::error::FindError;
use crate::registry::PredicateRegistry;
use crate::traits::{Command, Environment};

// ---------------------------------------------------------------------------
// CommandTable
// ---------------------------------------------------------------------------

/// Name to [`Command`] table, built once at startup.
#[derive(Default)]
pub struct CommandTable {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding `find`, backed by `registry`.
    pub fn with_builtins(registry: PredicateRegistry) -> Result<Self, FindError> {
        let mut table = Self::new();
        table.register("find", FindCommand::new(registry))?;
        Ok(table)
    }

    /// # Errors
    ///
    /// [`FindError::DuplicateCommand`] if `name` is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        command: impl Command + 'static,
    ) -> Result<(), FindError> {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return Err(FindError::DuplicateCommand(name));
        }
        self.commands.insert(name, Box::new(command));
        Ok(())
    }

    /// Run the command registered under `name`; `None` if there is none.
    pub fn dispatch(
        &self,
        name: &str,
        args: &[String],
        env: &Environment,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Option<i32> {
        let command = self.commands.get(name)?;
        tracing::debug!(command = name, ?args, "dispatching");
        Some(command.run(args, env, input, output))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// find
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "find",
    about = "Walk directory trees and print files matching an expression",
    override_usage = "find [-H|-L|-P] [-v] <PATH>... [EXPRESSION]",
    args_override_self = true,
    disable_version_flag = true
)]
struct FindArgs {
    /// Follow symbolic links named as root paths
    #[arg(short = 'H', overrides_with_all = ["follow_all", "follow_never"])]
    follow_roots: bool,

    /// Follow every symbolic link
    #[arg(short = 'L', overrides_with_all = ["follow_roots", "follow_never"])]
    follow_all: bool,

    /// Never follow symbolic links (default)
    #[arg(short = 'P', overrides_with_all = ["follow_roots", "follow_all"])]
    follow_never: bool,

    /// Print a `# `-prefixed diagnostic line for every visited entry
    #[arg(short = 'v')]
    verbose: bool,

    /// Root paths, then the expression: `( )`, `!`, `-a`, `-o`, `-name PATTERN`, ...
    #[arg(
        value_name = "PATH",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    rest: Vec<String>,
}

impl FindArgs {
    fn policy(&self) -> SymlinkPolicy {
        if self.follow_all {
            SymlinkPolicy::AlwaysFollow
        } else if self.follow_roots {
            SymlinkPolicy::FollowFromCommandLine
        } else {
            SymlinkPolicy::NeverFollow
        }
    }
}

/// Split trailing arguments into root paths and the expression. Roots end
/// at the first argument that can only belong to an expression.
fn split_roots(rest: &[String]) -> (&[String], &[String]) {
    let at = rest
        .iter()
        .position(|arg| arg.starts_with('-') || matches!(arg.as_str(), "(" | ")" | "!"))
        .unwrap_or(rest.len());
    rest.split_at(at)
}

/// `find [-H|-L|-P] [-v] <root-path>... [expression]`
///
/// Prints one matching path per line. With `-v`, a `# `-prefixed diagnostic
/// line precedes each visited entry's output. Exit code 0 on success (even
/// with no matches), 1 on a usage or parse failure.
pub struct FindCommand {
    registry: PredicateRegistry,
}

impl FindCommand {
    pub fn new(registry: PredicateRegistry) -> Self {
        Self { registry }
    }

    /// A leading `-X` that is neither an operator nor a registered predicate,
    /// so clap passed an unrecognised flag through as a hyphen value.
    fn is_unknown_option(&self, arg: &str) -> bool {
        match arg.strip_prefix('-') {
            Some("a" | "o") => false,
            Some(name) => self.registry.lookup(name).is_none(),
            None => false,
        }
    }

    fn execute(&self, args: FindArgs, output: &mut dyn Write) -> Result<(), FindError> {
        let (roots, expression) = split_roots(&args.rest);
        if let Some(flag) = expression.first().filter(|_| roots.is_empty()) {
            if self.is_unknown_option(flag) {
                return Err(FindError::Usage(format!("unknown option {flag}")));
            }
        }
        let verbose = args.verbose;

        let results = SearchBuilder::new(&self.registry)
            .roots(roots.iter())
            .expression(expression.iter().cloned())
            .symlinks(args.policy())
            .try_on_visit(|visit| {
                if verbose {
                    writeln!(output, "# {visit}").map_err(FindError::Output)?;
                }
                if visit.is_match() {
                    writeln!(output, "{}", visit.path.display()).map_err(FindError::Output)?;
                }
                Ok(())
            })
            .run()?;

        tracing::debug!(matches = results.matches, "find complete");
        Ok(())
    }
}

impl Command for FindCommand {
    fn run(
        &self,
        args: &[String],
        _env: &Environment,
        _input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> i32 {
        let argv = std::iter::once("find").chain(args.iter().map(String::as_str));
        let parsed = match FindArgs::try_parse_from(argv) {
            Ok(parsed) => parsed,
            Err(e) => {
                let help = matches!(e.kind(), ErrorKind::DisplayHelp);
                let _ = write!(output, "{}", e.render());
                return if help { 0 } else { 1 };
            }
        };

        match self.execute(parsed, output) {
            Ok(()) => 0,
            Err(e) => {
                let _ = writeln!(output, "find: {e}");
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    fn run_find(args: &[&str]) -> (i32, String) {
        let table = CommandTable::with_builtins(PredicateRegistry::with_builtins().unwrap()).unwrap();
        let mut out = Vec::new();
        let code = table
            .dispatch("find", &strings(args), &Environment::new(), &mut std::io::empty(), &mut out)
            .unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn split_stops_at_first_expression_argument() {
        let rest = strings(&["a", "b", "-name", "x", "c"]);
        let (roots, expr) = split_roots(&rest);
        assert_eq!(roots, &rest[..2]);
        assert_eq!(expr, &rest[2..]);

        let rest = strings(&["a", "(", "-true", ")"]);
        assert_eq!(split_roots(&rest).0.len(), 1);
    }

    #[test]
    fn last_symlink_flag_wins() {
        let args = FindArgs::try_parse_from(["find", "-L", "-H", "."]).unwrap();
        assert_eq!(args.policy(), SymlinkPolicy::FollowFromCommandLine);
        let args = FindArgs::try_parse_from(["find", "-H", "-P", "."]).unwrap();
        assert_eq!(args.policy(), SymlinkPolicy::NeverFollow);
        let args = FindArgs::try_parse_from(["find", "-v", "-L", "."]).unwrap();
        assert_eq!(args.policy(), SymlinkPolicy::AlwaysFollow);
        assert!(args.verbose);
    }

    #[test]
    fn prints_matches_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join("b.log"), "").unwrap();
        let root = dir.path().to_str().unwrap();

        let (code, out) = run_find(&[root, "-name", "*.txt"]);
        assert_eq!(code, 0);
        assert_eq!(out, format!("{}\n", dir.path().join("a.txt").display()));
    }

    #[test]
    fn verbose_lines_are_marked_and_interleaved() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        let root = dir.path().to_str().unwrap();

        let (code, out) = run_find(&["-v", root]);
        assert_eq!(code, 0);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("# dir "));
        assert!(lines[1].starts_with("# file ") && lines[1].ends_with(": true"));
        assert_eq!(lines[2], dir.path().join("a.txt").display().to_string());
    }

    #[test]
    fn no_matches_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let (code, out) = run_find(&[root, "-false"]);
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn parse_errors_exit_non_zero_without_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        let root = dir.path().to_str().unwrap();

        let (code, out) = run_find(&[root, "(", "-true"]);
        assert_eq!(code, 1);
        assert_eq!(
            out,
            "find: parse error on end of expression: unbalanced parentheses, expected ')'\n"
        );

        let (code, out) = run_find(&[root, "-bogus"]);
        assert_eq!(code, 1);
        assert_eq!(out, "find: parse error on -bogus: unknown predicate\n");
    }

    #[test]
    fn missing_root_is_a_usage_error() {
        let (code, out) = run_find(&[]);
        assert_eq!(code, 1);
        assert_eq!(out, "find: missing root path\n");
    }

    #[test]
    fn unknown_flag_is_reported_as_such() {
        let (code, out) = run_find(&["-X", "."]);
        assert_eq!(code, 1);
        assert_eq!(out, "find: unknown option -X\n");

        let (code, out) = run_find(&["-name", "x"]);
        assert_eq!(code, 1);
        assert_eq!(out, "find: missing root path\n");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_stops_the_walk() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("f{i}")), "").unwrap();
        }
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = PredicateRegistry::with_builtins().unwrap();
        let counter = Arc::clone(&calls);
        registry
            .register("count", move |_: &std::path::Path, _: &[String]| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            })
            .unwrap();

        let find = FindCommand::new(registry);
        let args = strings(&[dir.path().to_str().unwrap(), "-count"]);
        let code = find.run(&args, &Environment::new(), &mut std::io::empty(), &mut ClosedPipe);

        assert_eq!(code, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[test]
    fn skipped_entries_are_silent_without_verbose() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("missing", dir.path().join("dangling")).unwrap();
        let root = dir.path().to_str().unwrap();

        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let (code, out) = tracing::subscriber::with_default(subscriber, || run_find(&["-L", root]));

        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert!(logs.0.lock().unwrap().is_empty());

        let (code, out) = run_find(&["-L", "-v", root]);
        assert_eq!(code, 0);
        assert!(out.lines().any(|l| l.starts_with("# skip ")));
    }

    #[test]
    fn duplicate_command_is_rejected() {
        let mut table = CommandTable::with_builtins(PredicateRegistry::new()).unwrap();
        let echo = |args: &[String], _: &Environment, _: &mut dyn Read, out: &mut dyn Write| {
            let _ = writeln!(out, "{}", args.join(" "));
            0
        };
        let err = table.register("find", echo).unwrap_err();
        assert!(matches!(err, FindError::DuplicateCommand(ref name) if name == "find"));
        assert!(table
            .dispatch("nope", &[], &Environment::new(), &mut std::io::empty(), &mut Vec::new())
            .is_none());
    }
}
