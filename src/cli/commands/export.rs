//! Export command implementation.
//!
//! Validates the command line, opens the project read-only and either
//! exports it or, with `--dry-run`, reports what an export would write.

use std::env;
use std::path::Path;

use colored::Colorize;
use tracing::debug;

use crate::cli::Cli;
use crate::config::{resolve_path, validate_input_dir};
use crate::error::{Error, Result};
use crate::export::{ExportStats, Exporter};

/// Execute the export command.
///
/// # Errors
///
/// Returns `Error::MissingOutput` when no output directory was given, an
/// input error when the project directory is missing or not a directory,
/// or whatever the export itself fails with.
pub fn execute(cli: &Cli, json: bool) -> Result<()> {
    let output = cli
        .output
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(Error::MissingOutput)?;

    let cwd = env::current_dir()
        .map_err(|e| Error::Other(format!("Failed to get current directory: {e}")))?;

    let input = resolve_path(&cwd, cli.input.as_deref().unwrap_or(Path::new("")));
    validate_input_dir(&input)?;
    let output = resolve_path(&cwd, output);
    debug!(input = %input.display(), output = %output.display(), "Resolved paths");

    let exporter = Exporter::open(&input)?;

    let stats = if cli.dry_run {
        exporter.preview()?
    } else {
        exporter.export(&output)?
    };
    report(&stats, &input, &output, cli, json)
}

fn report(stats: &ExportStats, input: &Path, output: &Path, cli: &Cli, json: bool) -> Result<()> {
    if json {
        let summary = serde_json::json!({
            "success": true,
            "dry_run": cli.dry_run,
            "input": input.display().to_string(),
            "output": output.display().to_string(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    if cli.dry_run {
        println!("Would export from: {}", input.display());
        println!();
        println!("  Observations: {}", stats.observations);
        println!("  Media files:  {}", stats.media);
        println!("  Location:     {}", output.display().to_string().dimmed());
        return Ok(());
    }

    println!("{}", "Export complete".green().bold());
    println!();
    println!("  Observations: {}", stats.observations);
    println!("  Media files:  {}", stats.media);
    if stats.media > 0 {
        println!("  Media size:   {}", format_bytes(stats.bytes));
    }
    println!("  Location:     {}", output.display().to_string().dimmed());
    Ok(())
}

/// Human-readable byte count.
#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    format!("{size:.1} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;
    use tempfile::TempDir;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_missing_output_fails_before_input_check() {
        let cli = Cli::try_parse_from(["mapeo-exporter", "-i", "/definitely/not/here"]).unwrap();
        assert!(matches!(execute(&cli, true), Err(Error::MissingOutput)));
    }

    #[test]
    fn test_empty_output_counts_as_missing() {
        let cli = Cli::try_parse_from(["mapeo-exporter", "-o", ""]).unwrap();
        assert!(matches!(execute(&cli, true), Err(Error::MissingOutput)));
    }

    #[test]
    fn test_input_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("project.txt");
        std::fs::write(&file, "not a project").unwrap();
        let out = temp_dir.path().join("out");

        let cli = Cli::try_parse_from([
            OsString::from("mapeo-exporter"),
            OsString::from("-i"),
            file.clone().into_os_string(),
            OsString::from("-o"),
            out.clone().into_os_string(),
        ])
        .unwrap();

        assert!(matches!(
            execute(&cli, true),
            Err(Error::InputNotDirectory { path }) if path == file
        ));
        assert!(!out.exists());
    }
}
