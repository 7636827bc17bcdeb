//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, map::MapArgs, onboard::OnboardArgs, preview::PreviewArgs,
    submit::SubmitArgs, template::TemplateArgs, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "onboardify")]
#[command(author, version, about = "Fleet onboarding toolkit")]
#[command(long_about = "Map, validate and submit vehicle telemetry CSV exports as part of fleet onboarding.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how the CSV columns map onto the vehicle schema
    Map(MapArgs),

    /// Validate every row of a CSV file
    Validate(ValidateArgs),

    /// Show the normalized rows
    Preview(PreviewArgs),

    /// Submit a CSV file with fleet details to the store
    Submit(SubmitArgs),

    /// Run the interactive onboarding wizard
    Onboard(OnboardArgs),

    /// Print a CSV template with the canonical headers
    Template(TemplateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tables on a terminal
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}

impl OutputFormat {
    /// Resolve `Auto` against the configured default format
    pub fn resolve(self, configured: Option<&str>) -> Self {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| <OutputFormat as ValueEnum>::from_str(name, true).ok())
            .unwrap_or(OutputFormat::Auto)
    }
}

/// CSV input shared by the upload commands
#[derive(clap::Args, Debug, Clone)]
pub struct UploadArgs {
    /// CSV file with vehicle telemetry
    pub file: std::path::PathBuf,

    /// Override a column binding (e.g. --map lat=Latitude); `field=` unbinds
    #[arg(long = "map", value_name = "FIELD=COLUMN")]
    pub overrides: Vec<String>,
}
