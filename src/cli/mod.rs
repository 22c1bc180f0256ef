//! CLI definitions using clap.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::{INPUT_ENV, OUTPUT_ENV};
use crate::error::Error;

pub mod commands;

const EXAMPLES: &str = "\
Examples:
  mapeo-exporter --output ./export
  mapeo-exporter -i ~/mapeo-project -o ./export
  mapeo-exporter -i ~/mapeo-project -o ./export --dry-run --json";

/// Export observations and media from a Mapeo project directory
#[derive(Parser, Debug)]
#[command(
    name = "mapeo-exporter",
    author,
    version,
    about,
    long_about = None,
    after_help = EXAMPLES
)]
pub struct Cli {
    /// `help` prints this message, same as --help
    #[arg(value_parser = ["help"], hide = true)]
    pub command: Option<String>,

    /// Project directory to export (default: current directory)
    #[arg(short, long, env = INPUT_ENV, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Directory to write observations.json and media/ into
    #[arg(short, long, env = OUTPUT_ENV, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Report what would be exported without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Whether the positional `help` command was given.
    #[must_use]
    pub fn wants_help(&self) -> bool {
        self.command.as_deref() == Some("help")
    }
}

/// Whether `--json` appears among the raw arguments.
///
/// Used when parsing failed and no `Cli` exists to ask.
pub fn json_requested<I, T>(args: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .take_while(|arg| arg != "--")
        .any(|arg| arg == "--json")
}

/// Turn a clap parse failure into an `Error::InvalidArgument`.
///
/// Keeps the first line of clap's message, without its `error: ` prefix.
#[must_use]
pub fn usage_error(err: &clap::Error) -> Error {
    let rendered = err.render().to_string();
    let message = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("invalid arguments");
    Error::InvalidArgument(message.trim_start_matches("error: ").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["mapeo-exporter", "-i", "proj", "-o", "out", "-vv"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("proj")));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.wants_help());
    }

    #[test]
    fn test_positional_help() {
        let cli = Cli::try_parse_from(["mapeo-exporter", "help"]).unwrap();
        assert!(cli.wants_help());
    }

    #[test]
    fn test_unknown_positional_is_rejected() {
        assert!(Cli::try_parse_from(["mapeo-exporter", "export"]).is_err());
    }

    #[test]
    fn test_json_requested() {
        assert!(json_requested(["mapeo-exporter", "--bogus", "--json"]));
        assert!(!json_requested(["mapeo-exporter", "-o", "out"]));
        assert!(!json_requested(["mapeo-exporter", "--", "--json"]));
    }

    #[test]
    fn test_usage_error_from_unknown_flag() {
        let err = Cli::try_parse_from(["mapeo-exporter", "--bogus"]).unwrap_err();
        let err = usage_error(&err);

        assert!(matches!(&err, Error::InvalidArgument(message) if message.contains("--bogus")));
        assert!(!err.to_string().contains("error: "));
        assert_eq!(err.to_structured_json()["error"]["code"], "INVALID_ARGUMENT");
    }
}
