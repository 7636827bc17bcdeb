//! Tabular output for mappings and typed rows
//!
//! Rows are built once as [`TableRow`]s of typed [`CellValue`]s and then
//! rendered as an aligned terminal table, TSV, CSV or Markdown.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::args::OutputFormat;
use crate::cli::helpers::{escape_csv, truncate_str};
use crate::core::Number;

/// A typed table cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    /// Vehicle id or column name, highlighted
    Id(String),
    /// Parsed number; `Invalid` renders as `NaN`
    Number(Number),
    /// Fixed-precision float
    Float(f64, usize),
    Flag(bool),
    Empty,
}

impl CellValue {
    /// Plain text, no colors
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) | CellValue::Id(s) => s.clone(),
            CellValue::Number(Number::Value(v)) => v.to_string(),
            CellValue::Number(Number::Invalid) => "NaN".to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Flag(true) => "yes".to_string(),
            CellValue::Flag(false) => "no".to_string(),
            CellValue::Empty => "-".to_string(),
        }
    }

    fn display_width(&self) -> usize {
        self.raw().chars().count()
    }

    /// Format for terminal output, padded to `width`
    pub fn format_tsv(&self, width: usize) -> String {
        let text = truncate_str(&self.raw(), width);
        let padding = width.saturating_sub(text.chars().count());
        let styled = match self {
            CellValue::Id(_) => style(text).cyan().to_string(),
            CellValue::Number(Number::Invalid) => style(text).red().to_string(),
            CellValue::Flag(true) => style(text).green().to_string(),
            CellValue::Flag(false) | CellValue::Empty => style(text).dim().to_string(),
            _ => text,
        };
        match self {
            CellValue::Number(_) | CellValue::Float(..) => {
                format!("{}{}", " ".repeat(padding), styled)
            }
            _ => format!("{}{}", styled, " ".repeat(padding)),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(Number::Invalid) => String::new(),
            other => escape_csv(&other.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        self.raw().replace('|', "\\|")
    }
}

/// Column definition: lookup key, header and maximum width
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// One table row as key/value cells
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Renders rows against a fixed column set
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    noun: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            show_summary: true,
        }
    }

    /// Drop the trailing "N rows" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Render rows in the given format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Tsv => self.render_tsv(rows),
            _ => self.render_terminal(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(1);
                // Cap at defined width to prevent excessive expansion
                col.header.len().max(max_content).min(col.width)
            })
            .collect()
    }

    fn cell_or_empty<'r>(row: &'r TableRow, key: &str) -> &'r CellValue {
        row.get(key).unwrap_or(&CellValue::Empty)
    }

    fn render_terminal(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| Self::cell_or_empty(row, col.key).format_tsv(*w))
                .collect();
            out.push_str(parts.join("  ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!("{} {}(s)\n", style(rows.len()).cyan(), self.noun));
        }
        out
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&header.join("\t"));
        out.push('\n');
        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| Self::cell_or_empty(row, col.key).raw().replace(['\t', '\n'], " "))
                .collect();
            out.push_str(&values.join("\t"));
            out.push('\n');
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| Self::cell_or_empty(row, col.key).format_csv())
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(
                self.columns
                    .iter()
                    .map(|col| Self::cell_or_empty(row, col.key).format_md()),
            );
        }
        let mut table = builder.build();
        table.with(Style::markdown());
        format!("{}\n", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 12),
        ColumnDef::new("lat", "LAT", 10),
        ColumnDef::new("charging", "CHARGING", 8),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new()
                .cell("id", CellValue::Id("V1".into()))
                .cell("lat", CellValue::Number(Number::Value(40.5)))
                .cell("charging", CellValue::Flag(true)),
            TableRow::new()
                .cell("id", CellValue::Id("V2, north".into()))
                .cell("lat", CellValue::Number(Number::Invalid)),
        ]
    }

    #[test]
    fn test_csv_escapes_and_blanks_invalid_numbers() {
        let out = TableFormatter::new(COLUMNS, "row").render(&rows(), OutputFormat::Csv);
        assert_eq!(out, "id,lat,charging\nV1,40.5,yes\n\"V2, north\",,\n");
    }

    #[test]
    fn test_tsv_uses_raw_values() {
        let out = TableFormatter::new(COLUMNS, "row").render(&rows(), OutputFormat::Tsv);
        assert_eq!(out, "id\tlat\tcharging\nV1\t40.5\tyes\nV2, north\tNaN\t-\n");
    }

    #[test]
    fn test_markdown_has_header_row() {
        let out = TableFormatter::new(COLUMNS, "row").render(&rows(), OutputFormat::Md);
        let first = out.lines().next().unwrap_or_default();
        assert!(first.contains("ID") && first.contains("CHARGING"));
        assert!(out.contains("NaN"));
    }

    #[test]
    fn test_terminal_summary_can_be_disabled() {
        console::set_colors_enabled(false);
        let out = TableFormatter::new(COLUMNS, "row")
            .without_summary()
            .render(&rows(), OutputFormat::Auto);
        assert_eq!(out.lines().count(), 4);
    }
}
