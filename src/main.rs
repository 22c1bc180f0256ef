//! mapeo-exporter entry point.

use clap::{CommandFactory, Parser};
use mapeo_export::cli::{Cli, commands, json_requested, usage_error};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too, and are not failures
            if !e.use_stderr() {
                let _ = e.print();
                return ExitCode::SUCCESS;
            }
            if json_requested(std::env::args_os()) {
                let err = usage_error(&e);
                eprintln!("{}", err.to_structured_json());
                return ExitCode::from(err.exit_code());
            }
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.wants_help() {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose, cli.quiet);

    match commands::export::execute(&cli, cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if let Some(hint) = e.hint() {
                eprintln!("Error: {e}\n  Hint: {hint}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
