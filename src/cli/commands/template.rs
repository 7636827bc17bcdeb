//! `onboardify template` command - print a CSV template

use console::style;
use miette::Result;

use crate::cli::helpers::escape_csv;
use crate::core::SchemaField;

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Only print the header row
    #[arg(long)]
    pub headers_only: bool,
}

/// Example values, one per schema field, in field order
fn example_value(field: SchemaField) -> &'static str {
    match field {
        SchemaField::VehicleId => "TRK-001",
        SchemaField::VehicleName => "Truck 1",
        SchemaField::Lat => "40.7128",
        SchemaField::Lon => "-74.0060",
        SchemaField::DateTime => "2024-01-15 08:30:00",
        SchemaField::RouteUrl => "https://maps.example.com/routes/1",
        SchemaField::VehicleCharging => "no",
        SchemaField::SpeedKmh => "62.5",
        SchemaField::BatteryLevel => "80",
    }
}

/// Template lines: labels as headers, plus an example row
pub fn template_lines(headers_only: bool) -> Vec<String> {
    let headers: Vec<String> = SchemaField::all()
        .iter()
        .map(|f| escape_csv(f.label()))
        .collect();
    let mut lines = vec![headers.join(",")];
    if !headers_only {
        let example: Vec<String> = SchemaField::all()
            .iter()
            .map(|f| escape_csv(example_value(*f)))
            .collect();
        lines.push(example.join(","));
    }
    lines
}

pub fn run(args: TemplateArgs) -> Result<()> {
    // Output to stdout (can be redirected to file)
    for line in template_lines(args.headers_only) {
        println!("{}", line);
    }

    // Usage hint on stderr so it doesn't interfere with redirected output
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: onboardify template > fleet.csv",
        style("→").blue()
    );
    Ok(())
}
