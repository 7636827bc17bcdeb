//! `onboardify validate` command - check every row of a CSV file

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::args::{GlobalOpts, OutputFormat, UploadArgs};
use crate::cli::helpers::{announce, incomplete_mapping_error, load_upload};
use crate::core::{normalize, Normalized};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Show at most this many errors (all errors still count)
    #[arg(long, value_name = "N")]
    pub max_errors: Option<usize>,
}

/// Machine-readable validation result
#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    file: &'a str,
    rows: usize,
    valid: bool,
    failing_rows: usize,
    errors: Vec<String>,
}

/// Print the error list, truncated to `limit` entries
pub fn print_errors(normalized: &Normalized, limit: Option<usize>) {
    let shown = limit.unwrap_or(usize::MAX);
    for message in normalized.messages().iter().take(shown) {
        println!("  {} {}", style("✗").red(), message);
    }
    let hidden = normalized.errors.len().saturating_sub(shown);
    if hidden > 0 {
        println!("  {}", style(format!("... and {} more", hidden)).dim());
    }
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let (upload, mapping) = load_upload(&args.upload)?;
    if !mapping.is_complete() {
        return Err(incomplete_mapping_error(&mapping));
    }

    let normalized = normalize(upload.rows(), &mapping);
    let failing = normalized.failing_rows().len();

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = ValidationReport {
                file: upload.name(),
                rows: normalized.rows.len(),
                valid: normalized.is_clean(),
                failing_rows: failing,
                errors: normalized.messages(),
            };
            let out = if global.format == OutputFormat::Json {
                serde_json::to_string_pretty(&report).into_diagnostic()?
            } else {
                serde_yml::to_string(&report).into_diagnostic()?
            };
            println!("{}", out.trim_end());
        }
        _ => {
            announce("Validating", &upload, global.quiet);
            if !normalized.is_clean() {
                print_errors(&normalized, args.max_errors);
                println!();
            }

            if normalized.is_clean() {
                println!(
                    "{} {} rows valid",
                    style("✓").green(),
                    style(normalized.rows.len()).cyan()
                );
            } else {
                println!(
                    "{} {} error(s) in {} of {} rows",
                    style("✗").red(),
                    style(normalized.errors.len()).red(),
                    style(failing).yellow(),
                    normalized.rows.len()
                );
            }
        }
    }

    if !normalized.is_clean() {
        return Err(miette::miette!(
            "Validation failed with {} error(s)",
            normalized.errors.len()
        ));
    }
    Ok(())
}
