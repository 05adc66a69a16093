use std::io::Write;
use std::process::ExitCode;

use pathfind::{CommandTable, Environment, PredicateRegistry};

fn init_logging() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr);
    if let Err(e) = subscriber.try_init() {
        eprintln!("Failed to init tracing subscriber: {e}");
    }
}

fn main() -> ExitCode {
    init_logging();

    let table = match PredicateRegistry::with_builtins().and_then(CommandTable::with_builtins) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("find: {e}");
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let env: Environment = std::env::vars().collect();
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());

    let code = table
        .dispatch("find", &args, &env, &mut stdin.lock(), &mut out)
        .unwrap_or(127);
    if let Err(e) = out.flush() {
        eprintln!("find: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
