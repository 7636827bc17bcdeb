//! `onboardify submit` command - store a validated CSV with fleet details

use console::style;
use dialoguer::theme::ColorfulTheme;
use miette::Result;
use std::path::PathBuf;

use crate::cli::args::{GlobalOpts, UploadArgs};
use crate::cli::commands::onboard::{prompt_step, resolve_missing_fields};
use crate::cli::commands::validate::print_errors;
use crate::cli::helpers::{announce, incomplete_mapping_error, load_upload};
use crate::core::{
    reduce, Config, JsonFileSink, OnboardingForm, SchemaField, SessionState, SqliteStore, Step,
    SubmissionPayload, SubmitReceipt, Submitter, UploadAction,
};

/// Where a submission goes and who it is recorded as
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// SQLite database to store into (default: from config)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Also write the payload as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Only write the JSON payload, skip the database
    #[arg(long, requires = "json")]
    pub no_database: bool,

    /// Submitting user (default: config, then git user.email)
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Prompt for unmapped columns and missing fleet details
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Company name
    #[arg(long)]
    pub company: Option<String>,

    /// Number of vehicles in the fleet
    #[arg(long)]
    pub fleet_size: Option<String>,

    /// Vehicle type values (comma-separated, e.g. van,semi)
    #[arg(long, value_delimiter = ',')]
    pub vehicle_types: Vec<String>,

    /// Vehicle model values (comma-separated, e.g. ford-transit)
    #[arg(long, value_delimiter = ',')]
    pub vehicle_models: Vec<String>,

    /// Preferred manufacturer values (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub manufacturers: Vec<String>,

    /// Average energy cost per kWh
    #[arg(long)]
    pub energy_cost: Option<String>,

    /// Department name
    #[arg(long)]
    pub department: Option<String>,
}

impl SubmitArgs {
    /// Fleet details given on the command line
    fn form(&self) -> OnboardingForm {
        OnboardingForm::new()
            .with_company_name(self.company.clone().unwrap_or_default())
            .with_fleet_size(self.fleet_size.clone().unwrap_or_default())
            .with_vehicle_types(self.vehicle_types.clone())
            .with_vehicle_models(self.vehicle_models.clone())
            .with_preferred_manufacturers(self.manufacturers.clone())
            .with_energy_cost(self.energy_cost.clone().unwrap_or_default())
            .with_department(self.department.clone().unwrap_or_default())
    }
}

/// Open every destination selected by `store`.
///
/// The JSON file comes first: a failed file write must not leave a
/// committed database transaction behind.
pub fn open_submitters(store: &StoreArgs, config: &Config) -> Result<Vec<Box<dyn Submitter>>> {
    let mut submitters: Vec<Box<dyn Submitter>> = Vec::new();

    if let Some(json) = &store.json {
        submitters.push(Box::new(JsonFileSink::new(json)));
    }
    if !store.no_database {
        let path = store.database.clone().unwrap_or_else(|| config.database());
        let db = SqliteStore::open(&path).map_err(|e| miette::miette!("{}", e))?;
        submitters.push(Box::new(db));
    }

    Ok(submitters)
}

/// Send `payload` to every submitter, stopping at the first failure.
///
/// The error names the destinations that were already written.
pub fn submit_all(
    submitters: &mut [Box<dyn Submitter>],
    payload: &SubmissionPayload,
) -> Result<Vec<SubmitReceipt>> {
    let mut receipts: Vec<SubmitReceipt> = Vec::new();
    for submitter in submitters.iter_mut() {
        match submitter.submit(payload) {
            Ok(receipt) => receipts.push(receipt),
            Err(e) if receipts.is_empty() => return Err(miette::miette!("{}", e)),
            Err(e) => {
                let written: Vec<&str> = receipts.iter().map(|r| r.destination.as_str()).collect();
                return Err(miette::miette!(
                    "{} (document {} was already written to {})",
                    e,
                    payload.document_id,
                    written.join(", ")
                ));
            }
        }
    }
    Ok(receipts)
}

pub fn print_submission_summary(payload: &SubmissionPayload, receipts: &[SubmitReceipt]) {
    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Submission Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Document ID:  {}", style(&payload.document_id).cyan());
    println!("  Company:      {}", payload.onboarding.company_name);
    println!("  Source file:  {}", style(&payload.source.name).yellow());
    println!("  Rows stored:  {}", style(payload.data.len()).green());
    for receipt in receipts {
        println!("  Written to:   {}", receipt.destination);
    }
}

pub fn run(args: SubmitArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let theme = ColorfulTheme::default();
    let (upload, mapping) = load_upload(&args.upload)?;
    announce("Submitting", &upload, global.quiet);

    // Start from the auto mapping, then replay the overrides as edits
    let mut state = reduce(&SessionState::new(), UploadAction::Uploaded(upload));
    for field in SchemaField::all() {
        let wanted = mapping.get(*field);
        if state.mapping().get(*field) != wanted {
            state = reduce(
                &state,
                UploadAction::MappingChanged(*field, wanted.map(str::to_string)),
            );
        }
    }

    if !state.mapping().is_complete() {
        if !args.interactive {
            return Err(incomplete_mapping_error(state.mapping()));
        }
        state = resolve_missing_fields(&theme, &state)?;
    }

    if let Some(preview) = state.preview() {
        if !preview.is_clean() {
            print_errors(preview, Some(20));
            return Err(miette::miette!(
                help = "Fix the rows or the mapping and run `onboardify validate`",
                "Submission refused: {} validation error(s)",
                preview.errors.len()
            ));
        }
    }

    let confirmed = state
        .confirm()
        .ok_or_else(|| incomplete_mapping_error(state.mapping()))?;

    let mut form = args.form().with_upload(Some(confirmed));
    if args.interactive {
        for step in [Step::FleetInfo, Step::VehicleDetails, Step::Preferences] {
            while !form.validate_step(step).is_empty() {
                for problem in form.validate_step(step) {
                    println!("{} {}", style("✗").red(), problem);
                }
                form = prompt_step(&theme, step, &form)?;
            }
        }
    }

    let user = args.store.user.clone().unwrap_or_else(|| config.user());
    let payload = SubmissionPayload::from_form(user, &form).map_err(|e| miette::miette!("{}", e))?;

    let mut submitters = open_submitters(&args.store, &config)?;
    let receipts = submit_all(&mut submitters, &payload)?;

    if !global.quiet {
        print_submission_summary(&payload, &receipts);
    }
    Ok(())
}
