//! `onboardify onboard` command - the interactive onboarding wizard
//!
//! Walks the [`Wizard`] steps with dialoguer prompts. The CSV upload step
//! drives a [`SessionState`] through [`reduce`], so the prompts only ever
//! render a snapshot and feed actions back in.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::args::{GlobalOpts, OutputFormat};
use crate::cli::commands::map::{mapping_rows, print_mapping_status, MAPPING_COLUMNS};
use crate::cli::commands::submit::{open_submitters, print_submission_summary, submit_all, StoreArgs};
use crate::cli::commands::validate::print_errors;
use crate::cli::table::TableFormatter;
use crate::core::onboarding::{display_name, Choice, MANUFACTURERS, VEHICLE_MODELS, VEHICLE_TYPES};
use crate::core::{
    reduce, Config, ConfirmedUpload, FieldMapping, OnboardingForm, SchemaField, SessionState, Step,
    SubmissionPayload, Upload, UploadAction, Wizard,
};

const NOT_MAPPED: &str = "(not mapped)";

#[derive(clap::Args, Debug)]
pub struct OnboardArgs {
    /// CSV file to offer at the upload step
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Ask for company name and fleet size
pub fn prompt_fleet_info(theme: &ColorfulTheme, form: &OnboardingForm) -> Result<OnboardingForm> {
    let company: String = Input::with_theme(theme)
        .with_prompt("Company name")
        .with_initial_text(form.company_name.clone())
        .interact_text()
        .into_diagnostic()?;

    let fleet_size: String = Input::with_theme(theme)
        .with_prompt("Fleet size (number of vehicles)")
        .with_initial_text(form.fleet_size.clone())
        .validate_with(|input: &String| -> Result<(), &'static str> {
            match input.trim().parse::<f64>() {
                Ok(n) if n > 0.0 => Ok(()),
                _ => Err("Please enter the total number of vehicles in your fleet."),
            }
        })
        .interact_text()
        .into_diagnostic()?;

    Ok(form
        .with_company_name(company.trim())
        .with_fleet_size(fleet_size.trim()))
}

/// Multi-select over `options`, pre-checking the current values
fn prompt_choices(
    theme: &ColorfulTheme,
    prompt: &str,
    options: &[Choice],
    current: &[String],
) -> Result<Vec<String>> {
    let labels: Vec<&str> = options.iter().map(|c| c.label).collect();
    let checked: Vec<bool> = options
        .iter()
        .map(|c| current.iter().any(|v| v == c.value))
        .collect();

    let picked = MultiSelect::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .defaults(&checked)
        .interact()
        .into_diagnostic()?;

    Ok(picked.into_iter().map(|i| options[i].value.to_string()).collect())
}

/// Ask for vehicle types and models
pub fn prompt_vehicle_details(
    theme: &ColorfulTheme,
    form: &OnboardingForm,
) -> Result<OnboardingForm> {
    let types = prompt_choices(theme, "Vehicle types (space to select)", VEHICLE_TYPES, &form.vehicle_types)?;
    let models = prompt_choices(theme, "Vehicle models (space to select)", VEHICLE_MODELS, &form.vehicle_models)?;
    Ok(form.with_vehicle_types(types).with_vehicle_models(models))
}

/// Ask for manufacturers, energy cost and department
pub fn prompt_preferences(theme: &ColorfulTheme, form: &OnboardingForm) -> Result<OnboardingForm> {
    let manufacturers = prompt_choices(
        theme,
        "Preferred manufacturers (space to select)",
        MANUFACTURERS,
        &form.preferred_manufacturers,
    )?;

    let energy_cost: String = Input::with_theme(theme)
        .with_prompt("Average energy cost per kWh")
        .with_initial_text(form.energy_cost.clone())
        .interact_text()
        .into_diagnostic()?;

    let department: String = Input::with_theme(theme)
        .with_prompt("Department")
        .with_initial_text(form.department.clone())
        .interact_text()
        .into_diagnostic()?;

    Ok(form
        .with_preferred_manufacturers(manufacturers)
        .with_energy_cost(energy_cost.trim())
        .with_department(department.trim()))
}

/// Prompts for a metadata step; other steps return the form unchanged
pub fn prompt_step(theme: &ColorfulTheme, step: Step, form: &OnboardingForm) -> Result<OnboardingForm> {
    match step {
        Step::FleetInfo => prompt_fleet_info(theme, form),
        Step::VehicleDetails => prompt_vehicle_details(theme, form),
        Step::Preferences => prompt_preferences(theme, form),
        Step::CsvUpload | Step::Complete => Ok(form.clone()),
    }
}

/// Select items for `field` and the index to preselect.
///
/// Optional fields get a trailing "(not mapped)" entry, preselected while
/// the field is unbound.
pub fn binding_choices(
    headers: &[String],
    mapping: &FieldMapping,
    field: SchemaField,
) -> (Vec<String>, usize) {
    let mut items: Vec<String> = headers.to_vec();
    let unbound = if field.is_required() {
        0
    } else {
        items.push(NOT_MAPPED.to_string());
        items.len() - 1
    };
    let current = mapping
        .get(field)
        .and_then(|c| headers.iter().position(|h| h == c))
        .unwrap_or(unbound);
    (items, current)
}

/// Bind one field to a header (or unset it) through a select prompt
pub fn prompt_field_binding(
    theme: &ColorfulTheme,
    state: &SessionState,
    field: SchemaField,
) -> Result<SessionState> {
    let (items, current) = binding_choices(state.headers(), state.mapping(), field);

    let selection = Select::with_theme(theme)
        .with_prompt(format!(
            "Column for {}{}",
            field.label(),
            if field.is_required() { " *" } else { "" }
        ))
        .items(&items)
        .default(current)
        .interact()
        .into_diagnostic()?;

    let column = state.headers().get(selection).cloned();
    Ok(reduce(state, UploadAction::MappingChanged(field, column)))
}

/// Prompt for every required field that is still unbound
pub fn resolve_missing_fields(theme: &ColorfulTheme, state: &SessionState) -> Result<SessionState> {
    let mut state = state.clone();
    for field in state.mapping().missing_required() {
        state = prompt_field_binding(theme, &state, field)?;
    }
    Ok(state)
}

fn read_upload(path: &str, state: &SessionState) -> SessionState {
    match Upload::from_path(std::path::Path::new(path)) {
        Ok(upload) => reduce(state, UploadAction::Uploaded(upload)),
        Err(e) => reduce(state, UploadAction::UploadFailed(e.to_string())),
    }
}

fn show_session(state: &SessionState) {
    println!();
    TableFormatter::new(MAPPING_COLUMNS, "field")
        .without_summary()
        .output(&mapping_rows(state.mapping()), OutputFormat::Auto);
    print_mapping_status(state.mapping(), state.headers());

    if let Some(preview) = state.preview() {
        println!();
        if preview.is_clean() {
            println!(
                "{} {} rows ready to import",
                style("✓").green(),
                style(preview.rows.len()).cyan()
            );
        } else {
            println!("{}", style("Validation errors:").red().bold());
            print_errors(preview, Some(10));
        }
    }
    println!();
}

/// The CSV upload step. `None` means the user went back.
fn upload_step(theme: &ColorfulTheme, initial: Option<&PathBuf>) -> Result<Option<ConfirmedUpload>> {
    let mut state = SessionState::new();
    let mut suggested = initial.map(|p| p.display().to_string()).unwrap_or_default();

    loop {
        if state.upload().is_none() {
            let path: String = Input::with_theme(theme)
                .with_prompt("Path to CSV file")
                .with_initial_text(suggested.clone())
                .interact_text()
                .into_diagnostic()?;
            suggested = path.clone();
            state = read_upload(path.trim(), &state);

            if let Some(failure) = state.failure() {
                println!("{} {}", style("✗").red(), failure);
                if !Confirm::with_theme(theme)
                    .with_prompt("Try another file?")
                    .default(true)
                    .interact()
                    .into_diagnostic()?
                {
                    return Ok(None);
                }
                state = reduce(&state, UploadAction::Replaced);
                continue;
            }
            state = resolve_missing_fields(theme, &state)?;
        }

        show_session(&state);

        let mut actions = Vec::new();
        if state.can_confirm() {
            actions.push("Confirm mapping");
        }
        actions.extend(["Change a column", "Upload a different file", "Back"]);

        let choice = Select::with_theme(theme)
            .with_prompt("Column mapping")
            .items(&actions)
            .default(0)
            .interact()
            .into_diagnostic()?;

        match actions[choice] {
            "Confirm mapping" => return Ok(state.confirm()),
            "Change a column" => {
                let fields: Vec<String> = SchemaField::all()
                    .iter()
                    .map(|f| {
                        format!(
                            "{}{} ({})",
                            f.label(),
                            if f.is_required() { " *" } else { "" },
                            state.mapping().get(*f).unwrap_or("not mapped")
                        )
                    })
                    .collect();
                let picked = Select::with_theme(theme)
                    .with_prompt("Field")
                    .items(&fields)
                    .default(0)
                    .interact()
                    .into_diagnostic()?;
                state = prompt_field_binding(theme, &state, SchemaField::all()[picked])?;
            }
            "Upload a different file" => state = reduce(&state, UploadAction::Replaced),
            _ => return Ok(None),
        }
    }
}

fn print_review(form: &OnboardingForm) {
    let names = |values: &[String], options: &[Choice]| {
        values
            .iter()
            .map(|v| display_name(v, options))
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("  Company:        {}", style(&form.company_name).cyan());
    println!("  Fleet size:     {}", form.fleet_size);
    println!("  Vehicle types:  {}", names(&form.vehicle_types, VEHICLE_TYPES));
    println!("  Vehicle models: {}", names(&form.vehicle_models, VEHICLE_MODELS));
    println!(
        "  Manufacturers:  {}",
        names(&form.preferred_manufacturers, MANUFACTURERS)
    );
    println!("  Energy cost:    {}", form.energy_cost);
    println!("  Department:     {}", form.department);
    if let Some(upload) = &form.upload {
        println!(
            "  CSV file:       {} ({} rows)",
            style(&upload.file_name).yellow(),
            upload.rows.len()
        );
    }
}

pub fn run(args: OnboardArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let theme = ColorfulTheme::default();
    let mut wizard = Wizard::new();

    loop {
        let step = wizard.step();
        println!();
        println!(
            "{} {}: {}",
            style(format!("[{:>3.0}%]", wizard.progress())).dim(),
            style(step.title()).bold(),
            step.description()
        );

        let form = match step {
            Step::CsvUpload => match upload_step(&theme, args.file.as_ref())? {
                Some(confirmed) => wizard.form().with_upload(Some(confirmed)),
                None => {
                    wizard = wizard.back();
                    continue;
                }
            },
            Step::Complete => {
                print_review(wizard.form());
                println!();
                let submit = Confirm::with_theme(&theme)
                    .with_prompt("Submit onboarding?")
                    .default(true)
                    .interact()
                    .into_diagnostic()?;
                if !submit {
                    wizard = wizard.back();
                    continue;
                }

                let user = args.store.user.clone().unwrap_or_else(|| config.user());
                let payload = SubmissionPayload::from_form(user, wizard.form())
                    .map_err(|e| miette::miette!("{}", e))?;
                let mut submitters = open_submitters(&args.store, &config)?;
                let receipts = submit_all(&mut submitters, &payload)?;
                if !global.quiet {
                    print_submission_summary(&payload, &receipts);
                }
                return Ok(());
            }
            other => prompt_step(&theme, other, wizard.form())?,
        };

        let updated = wizard.update(form);
        wizard = match updated.next() {
            Ok(next) => next,
            Err(problems) => {
                for problem in problems {
                    println!("{} {}", style("✗").red(), problem);
                }
                updated
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::map_columns;

    fn headers() -> Vec<String> {
        ["Vehicle ID", "Lat", "Battery Level"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    #[test]
    fn test_unbound_optional_field_preselects_not_mapped() {
        let headers = headers();
        let mapping = FieldMapping::new();
        let (items, current) = binding_choices(&headers, &mapping, SchemaField::SpeedKmh);
        assert_eq!(items.len(), 4);
        assert_eq!(items[current], NOT_MAPPED);
    }

    #[test]
    fn test_bound_field_preselects_its_column() {
        let headers = headers();
        let mapping = map_columns(headers.as_slice());
        let (items, current) = binding_choices(&headers, &mapping, SchemaField::BatteryLevel);
        assert_eq!(items[current], "Battery Level");
    }

    #[test]
    fn test_required_field_has_no_unmapped_entry() {
        let headers = headers();
        let (items, current) = binding_choices(&headers, &FieldMapping::new(), SchemaField::Lon);
        assert_eq!(items, headers);
        assert_eq!(current, 0);
    }
}
