//! `onboardify map` command - show the column mapping for a CSV file

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::args::{GlobalOpts, OutputFormat, UploadArgs};
use crate::cli::helpers::load_upload;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::core::{detect_date_format, DateFormat, FieldMapping, SchemaField, Upload};

#[derive(clap::Args, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub upload: UploadArgs,
}

pub const MAPPING_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("field", "FIELD", 16),
    ColumnDef::new("label", "LABEL", 24),
    ColumnDef::new("required", "REQUIRED", 8),
    ColumnDef::new("column", "COLUMN", 32),
];

/// Machine-readable view of a mapping
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingReport<'a> {
    file: &'a str,
    headers: &'a [String],
    mapping: &'a FieldMapping,
    complete: bool,
    missing_required: Vec<SchemaField>,
    unmapped_headers: Vec<&'a str>,
    date_format: Option<String>,
}

/// Layout of the first row's date/time cell, when it is a known one
pub fn detected_date_format(upload: &Upload, mapping: &FieldMapping) -> Option<DateFormat> {
    let first = upload.rows().first()?;
    detect_date_format(first.cell(mapping.get(SchemaField::DateTime)).as_str())
}

/// One table row per schema field
pub fn mapping_rows(mapping: &FieldMapping) -> Vec<TableRow> {
    SchemaField::all()
        .iter()
        .map(|field| {
            TableRow::new()
                .cell("field", CellValue::Id(field.as_str().to_string()))
                .cell("label", CellValue::Text(field.label().to_string()))
                .cell("required", CellValue::Flag(field.is_required()))
                .cell(
                    "column",
                    mapping
                        .get(*field)
                        .map(|c| CellValue::Text(c.to_string()))
                        .unwrap_or(CellValue::Empty),
                )
        })
        .collect()
}

/// Print the completeness line under a mapping table
pub fn print_mapping_status(mapping: &FieldMapping, headers: &[String]) {
    let unmapped = mapping.unmapped_headers(headers);
    if !unmapped.is_empty() {
        println!();
        println!("{} {}", style("Unmapped columns:").dim(), unmapped.join(", "));
    }

    println!();
    if mapping.is_complete() {
        println!("{} All required fields are mapped", style("✓").green());
    } else {
        let missing: Vec<&str> = mapping.missing_required().iter().map(|f| f.as_str()).collect();
        println!(
            "{} Missing required fields: {}",
            style("✗").red(),
            style(missing.join(", ")).yellow()
        );
    }
}

pub fn run(args: MapArgs, global: &GlobalOpts) -> Result<()> {
    let (upload, mapping) = load_upload(&args.upload)?;

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = MappingReport {
                file: upload.name(),
                headers: upload.headers(),
                mapping: &mapping,
                complete: mapping.is_complete(),
                missing_required: mapping.missing_required(),
                unmapped_headers: mapping.unmapped_headers(upload.headers()),
                date_format: detected_date_format(&upload, &mapping).map(|f| f.pattern().to_string()),
            };
            let out = if global.format == OutputFormat::Json {
                serde_json::to_string_pretty(&report).into_diagnostic()?
            } else {
                serde_yml::to_string(&report).into_diagnostic()?
            };
            println!("{}", out.trim_end());
        }
        format => {
            let formatter = TableFormatter::new(MAPPING_COLUMNS, "field").without_summary();
            formatter.output(&mapping_rows(&mapping), format);
            if format == OutputFormat::Auto && !global.quiet {
                print_mapping_status(&mapping, upload.headers());
                if let Some(date_format) = detected_date_format(&upload, &mapping) {
                    println!("  {} {}", style("Date format:").dim(), date_format.pattern());
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::map_columns;

    #[test]
    fn test_mapping_rows_cover_every_field() {
        let mapping = map_columns(&["Vehicle ID", "Lat"]);
        let rows = mapping_rows(&mapping);
        assert_eq!(rows.len(), SchemaField::all().len());
        assert_eq!(rows[0].get("column"), Some(&CellValue::Text("Vehicle ID".into())));
        assert_eq!(rows[1].get("column"), Some(&CellValue::Empty));
    }
}
