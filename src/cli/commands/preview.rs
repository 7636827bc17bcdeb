//! `onboardify preview` command - show the normalized rows

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::args::{GlobalOpts, OutputFormat, UploadArgs};
use crate::cli::helpers::{announce, incomplete_mapping_error, load_upload};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::core::{normalize, Config, TypedRow};

#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Number of rows to show (default: preview_rows from config)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub const ROW_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("row", "ROW", 5),
    ColumnDef::new("vehicle_id", "VEHICLE ID", 14),
    ColumnDef::new("vehicle_name", "NAME", 20),
    ColumnDef::new("lat", "LAT", 11),
    ColumnDef::new("lon", "LON", 11),
    ColumnDef::new("date_time", "DATE/TIME", 20),
    ColumnDef::new("route_url", "ROUTE URL", 30),
    ColumnDef::new("charging", "CHARGING", 8),
    ColumnDef::new("speed", "KM/H", 7),
    ColumnDef::new("battery", "BATTERY", 7),
];

/// Table rows for typed rows; row numbers are 1-based
pub fn typed_rows(rows: &[TypedRow]) -> Vec<TableRow> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            TableRow::new()
                .cell("row", CellValue::Text((index + 1).to_string()))
                .cell("vehicle_id", CellValue::Id(row.vehicle_id.clone()))
                .cell("vehicle_name", CellValue::Text(row.vehicle_name.clone()))
                .cell("lat", CellValue::Number(row.lat))
                .cell("lon", CellValue::Number(row.lon))
                .cell("date_time", CellValue::Text(row.date_time.clone()))
                .cell("route_url", CellValue::Text(row.route_url.clone()))
                .cell("charging", CellValue::Flag(row.vehicle_charging))
                .cell("speed", CellValue::Float(row.speed_kmh, 1))
                .cell(
                    "battery",
                    row.battery_level
                        .map(CellValue::Number)
                        .unwrap_or(CellValue::Empty),
                )
        })
        .collect()
}

pub fn run(args: PreviewArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let (upload, mapping) = load_upload(&args.upload)?;
    if !mapping.is_complete() {
        return Err(incomplete_mapping_error(&mapping));
    }

    let normalized = normalize(upload.rows(), &mapping);
    let limit = args.limit.unwrap_or_else(|| config.preview_rows());
    let shown: Vec<TypedRow> = normalized.rows.iter().take(limit).cloned().collect();

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&shown).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&shown).into_diagnostic()?;
            print!("{}", yaml);
        }
        format => {
            announce("Previewing", &upload, global.quiet);
            let mut formatter = TableFormatter::new(ROW_COLUMNS, "row");
            if global.quiet || format != OutputFormat::Auto {
                formatter = formatter.without_summary();
            }
            formatter.output(&typed_rows(&shown), format);
        }
    }

    if !global.quiet {
        if shown.len() < normalized.rows.len() {
            eprintln!(
                "{}",
                style(format!(
                    "Showing {} of {} rows (use --limit to see more)",
                    shown.len(),
                    normalized.rows.len()
                ))
                .dim()
            );
        }
        if !normalized.is_clean() {
            eprintln!(
                "{} {} validation error(s); run `onboardify validate` for details",
                style("!").yellow(),
                normalized.errors.len()
            );
        }
    }

    Ok(())
}
