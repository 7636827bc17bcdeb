//! Onboarding wizard: fleet metadata steps and step gating
//!
//! The form is an immutable snapshot. Each `with_*` method returns an
//! updated copy, and [`Wizard`] only moves forward when the current step
//! validates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::session::ConfirmedUpload;

/// A selectable option: stored value plus display label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

const fn choice(label: &'static str, value: &'static str) -> Choice {
    Choice { value, label }
}

pub const VEHICLE_TYPES: &[Choice] = &[
    choice("Van", "van"),
    choice("Pickup Truck", "pickup"),
    choice("Box Truck", "box"),
    choice("Semi-Truck", "semi"),
    choice("Dump Truck", "dump"),
    choice("Flatbed Truck", "flatbed"),
    choice("Tanker Truck", "tanker"),
];

pub const VEHICLE_MODELS: &[Choice] = &[
    choice("Ford F-150", "ford-f150"),
    choice("Ford Transit", "ford-transit"),
    choice("Chevrolet Silverado", "chevy-silverado"),
    choice("RAM 1500", "ram-1500"),
    choice("Freightliner Cascadia", "freightliner-cascadia"),
    choice("Peterbilt 579", "peterbilt-579"),
    choice("Kenworth T680", "kenworth-t680"),
    choice("Volvo VNL", "volvo-vnl"),
    choice("International LT", "international-lt"),
];

pub const MANUFACTURERS: &[Choice] = &[
    choice("Ford", "ford"),
    choice("Chevrolet", "chevrolet"),
    choice("RAM", "ram"),
    choice("Toyota", "toyota"),
    choice("Freightliner", "freightliner"),
    choice("Peterbilt", "peterbilt"),
    choice("Kenworth", "kenworth"),
    choice("Volvo", "volvo"),
    choice("International", "international"),
    choice("Mack", "mack"),
];

/// Label for `value` in `options`, or the value itself when unknown
pub fn display_name(value: &str, options: &[Choice]) -> String {
    options
        .iter()
        .find(|c| c.value == value)
        .map(|c| c.label.to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Wizard steps, in order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    FleetInfo,
    VehicleDetails,
    Preferences,
    CsvUpload,
    Complete,
}

impl Step {
    pub fn all() -> &'static [Step] {
        &[
            Step::FleetInfo,
            Step::VehicleDetails,
            Step::Preferences,
            Step::CsvUpload,
            Step::Complete,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::FleetInfo => "Fleet Information",
            Step::VehicleDetails => "Vehicle Details",
            Step::Preferences => "Preferences",
            Step::CsvUpload => "CSV Upload",
            Step::Complete => "Complete",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Step::FleetInfo => "Tell us about your fleet size",
            Step::VehicleDetails => "What types of vehicles do you operate?",
            Step::Preferences => "Additional information about your operations",
            Step::CsvUpload => "Upload your vehicle data",
            Step::Complete => "Review your information",
        }
    }

    fn index(&self) -> usize {
        Step::all().iter().position(|s| s == self).unwrap_or(0)
    }

    fn next(&self) -> Option<Step> {
        Step::all().get(self.index() + 1).copied()
    }

    fn previous(&self) -> Option<Step> {
        self.index().checked_sub(1).and_then(|i| Step::all().get(i).copied())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Fleet metadata collected across the wizard steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingForm {
    pub company_name: String,
    pub fleet_size: String,
    pub vehicle_types: Vec<String>,
    pub vehicle_models: Vec<String>,
    pub preferred_manufacturers: Vec<String>,
    /// Average energy cost per kWh, as entered
    pub energy_cost: String,
    pub department: String,
    #[serde(skip)]
    pub upload: Option<ConfirmedUpload>,
}

impl OnboardingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_company_name(&self, name: impl Into<String>) -> Self {
        Self {
            company_name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_fleet_size(&self, size: impl Into<String>) -> Self {
        Self {
            fleet_size: size.into(),
            ..self.clone()
        }
    }

    pub fn with_vehicle_types(&self, types: Vec<String>) -> Self {
        Self {
            vehicle_types: types,
            ..self.clone()
        }
    }

    pub fn with_vehicle_models(&self, models: Vec<String>) -> Self {
        Self {
            vehicle_models: models,
            ..self.clone()
        }
    }

    pub fn with_preferred_manufacturers(&self, manufacturers: Vec<String>) -> Self {
        Self {
            preferred_manufacturers: manufacturers,
            ..self.clone()
        }
    }

    pub fn with_energy_cost(&self, cost: impl Into<String>) -> Self {
        Self {
            energy_cost: cost.into(),
            ..self.clone()
        }
    }

    pub fn with_department(&self, department: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            ..self.clone()
        }
    }

    /// Attach a confirmed upload; `None` clears it (upload replaced)
    pub fn with_upload(&self, upload: Option<ConfirmedUpload>) -> Self {
        Self {
            upload,
            ..self.clone()
        }
    }

    /// Fleet size as a number, when it parses
    pub fn fleet_size_value(&self) -> Option<f64> {
        self.fleet_size.trim().parse::<f64>().ok()
    }

    /// Problems preventing `step` from being completed; empty when valid
    pub fn validate_step(&self, step: Step) -> Vec<&'static str> {
        let mut problems = Vec::new();
        match step {
            Step::FleetInfo => {
                if self.company_name.is_empty() {
                    problems.push("Please enter the name of your company.");
                }
                if !self.fleet_size_value().is_some_and(|n| n > 0.0) {
                    problems.push("Please enter the total number of vehicles in your fleet.");
                }
            }
            Step::VehicleDetails => {
                if self.vehicle_types.is_empty() {
                    problems.push("Select at least one vehicle type.");
                }
                if self.vehicle_models.is_empty() {
                    problems.push("Select at least one vehicle model.");
                }
            }
            Step::Preferences => {
                if self.preferred_manufacturers.is_empty() {
                    problems.push("Select at least one preferred manufacturer.");
                }
                if self.energy_cost.trim().is_empty() {
                    problems.push("Please enter your average energy cost.");
                }
                if self.department.trim().is_empty() {
                    problems.push("Please enter your department name.");
                }
            }
            Step::CsvUpload => {
                if self.upload.is_none() {
                    problems.push("Please upload a CSV file");
                }
            }
            Step::Complete => {}
        }
        problems
    }

    /// True when every step before `Complete` validates
    pub fn is_ready(&self) -> bool {
        Step::all()
            .iter()
            .all(|step| self.validate_step(*step).is_empty())
    }
}

/// Step position plus the form being filled in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wizard {
    step: Step,
    form: OnboardingForm,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn form(&self) -> &OnboardingForm {
        &self.form
    }

    /// Replace the form, staying on the current step
    pub fn update(&self, form: OnboardingForm) -> Self {
        Self {
            step: self.step,
            form,
        }
    }

    /// Progress through the wizard as a percentage
    pub fn progress(&self) -> f64 {
        (self.step.index() + 1) as f64 / Step::all().len() as f64 * 100.0
    }

    /// Advance if the current step validates; otherwise return its problems
    pub fn next(&self) -> Result<Self, Vec<&'static str>> {
        let problems = self.form.validate_step(self.step);
        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(Self {
            step: self.step.next().unwrap_or(self.step),
            form: self.form.clone(),
        })
    }

    /// Go back one step; the first step stays put
    pub fn back(&self) -> Self {
        Self {
            step: self.step.previous().unwrap_or(self.step),
            form: self.form.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> OnboardingForm {
        OnboardingForm::new()
            .with_company_name("Acme Freight")
            .with_fleet_size("12")
            .with_vehicle_types(vec!["semi".into()])
            .with_vehicle_models(vec!["volvo-vnl".into()])
            .with_preferred_manufacturers(vec!["volvo".into()])
            .with_energy_cost("0.12")
            .with_department("Logistics")
    }

    #[test]
    fn test_fleet_info_validation() {
        let form = OnboardingForm::new();
        assert_eq!(
            form.validate_step(Step::FleetInfo),
            vec![
                "Please enter the name of your company.",
                "Please enter the total number of vehicles in your fleet."
            ]
        );

        let zero = form.with_company_name("Acme").with_fleet_size("0");
        assert_eq!(zero.validate_step(Step::FleetInfo).len(), 1);

        let ok = zero.with_fleet_size("3");
        assert!(ok.validate_step(Step::FleetInfo).is_empty());
    }

    #[test]
    fn test_preferences_require_non_blank_text() {
        let form = filled_form().with_energy_cost("   ");
        assert_eq!(
            form.validate_step(Step::Preferences),
            vec!["Please enter your average energy cost."]
        );
    }

    #[test]
    fn test_wizard_gates_on_current_step() {
        let wizard = Wizard::new();
        assert!(wizard.next().is_err());

        let wizard = wizard.update(filled_form());
        let wizard = wizard.next().unwrap();
        assert_eq!(wizard.step(), Step::VehicleDetails);
        let wizard = wizard.next().unwrap().next().unwrap();
        assert_eq!(wizard.step(), Step::CsvUpload);

        let problems = wizard.next().unwrap_err();
        assert_eq!(problems, vec!["Please upload a CSV file"]);
    }

    #[test]
    fn test_back_stops_at_first_step() {
        let wizard = Wizard::new();
        assert_eq!(wizard.back().step(), Step::FleetInfo);
    }

    #[test]
    fn test_progress() {
        assert_eq!(Wizard::new().progress(), 20.0);
    }

    #[test]
    fn test_display_name_falls_back_to_value() {
        assert_eq!(display_name("semi", VEHICLE_TYPES), "Semi-Truck");
        assert_eq!(display_name("hovercraft", VEHICLE_TYPES), "hovercraft");
    }

    #[test]
    fn test_form_not_ready_without_upload() {
        assert!(!filled_form().is_ready());
    }
}
