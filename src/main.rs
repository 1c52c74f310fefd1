use argh::FromArgs;
use minish::input::{EditorSource, PipedSource};
use minish::{Interpreter, banner, signals};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A minimal interactive shell.
struct Args {
    /// do not print the welcome banner on startup
    #[argh(switch, short = 'q')]
    quiet: bool,

    /// print debug logs to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    signals::install()?;
    if !args.quiet {
        banner::write_help(&mut std::io::stdout(), &minish::builtin_names())?;
    }
    let mut shell = Interpreter::default();
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        shell.repl(&mut EditorSource::new()?)
    } else {
        tracing::debug!("stdin is not a terminal, reading lines directly");
        shell.repl(&mut PipedSource::new(stdin.lock(), std::io::stdout()))
    }
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("fatal: {e:?}");
            eprintln!("minish: {e:#}");
            ExitCode::FAILURE
        }
    }
}
