//! Shared helper functions for CLI commands

use console::style;
use miette::Result;

use crate::cli::args::UploadArgs;
use crate::core::{map_columns, FieldMapping, Upload};

/// Truncate a string to max_len, adding "..." if truncated
///
/// Cuts on a char boundary so multi-byte cells never panic.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Read the upload and build its mapping: auto-detected, then --map overrides
pub fn load_upload(args: &UploadArgs) -> Result<(Upload, FieldMapping)> {
    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }
    let upload = Upload::from_path(&args.file).map_err(|e| miette::miette!("{}", e))?;
    let mapping = map_columns(upload.headers())
        .apply_overrides(&args.overrides, upload.headers())
        .map_err(|e| miette::miette!("{}", e))?;
    Ok((upload, mapping))
}

/// Error for commands that need every required field bound
pub fn incomplete_mapping_error(mapping: &FieldMapping) -> miette::Report {
    let missing: Vec<String> = mapping
        .missing_required()
        .iter()
        .map(|f| f.as_str().to_string())
        .collect();
    miette::miette!(
        help = "Bind them with --map FIELD=COLUMN",
        "Required fields are not mapped: {}",
        missing.join(", ")
    )
}

/// Print the "→ Reading ..." banner unless quiet
pub fn announce(action: &str, upload: &Upload, quiet: bool) {
    if quiet {
        return;
    }
    eprintln!(
        "{} {} {} ({} rows)",
        style("→").blue(),
        action,
        style(upload.name()).yellow(),
        style(upload.rows().len()).cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Zürich depot north", 8), "Züric...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }
}
