//! Row normalization and validation
//!
//! Normalization turns raw string rows into [`TypedRow`]s according to a
//! [`FieldMapping`], then validates every row. Validation never fails the
//! pass: each violated constraint becomes a [`RowError`] returned next to
//! the best-effort typed rows. The pass is pure, so running it again after
//! a mapping edit yields a fresh result and replaces the previous one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::core::cell::{Cell, Number};
use crate::core::field::SchemaField;
use crate::core::mapping::FieldMapping;
use crate::core::timestamp::is_valid_timestamp;

/// One uploaded CSV line, keyed by header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    cells: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Cell under `column`; an unset column or absent key is [`Cell::Missing`]
    pub fn cell(&self, column: Option<&str>) -> Cell<'_> {
        column
            .and_then(|c| self.cells.get(c))
            .map(|v| Cell::Text(v.as_str()))
            .unwrap_or(Cell::Missing)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A normalized telemetry row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedRow {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub lat: Number,
    pub lon: Number,
    pub date_time: String,
    pub route_url: String,
    pub vehicle_charging: bool,
    pub speed_kmh: f64,
    /// `None` means the upload carried no battery reading for this row
    pub battery_level: Option<Number>,
}

impl TypedRow {
    /// Normalize one raw row under `mapping`
    pub fn from_raw(raw: &RawRow, mapping: &FieldMapping) -> Self {
        let cell = |field: SchemaField| raw.cell(mapping.get(field));

        let battery_cell = cell(SchemaField::BatteryLevel);
        let battery_level = if battery_cell.has_text() {
            Some(battery_cell.number())
        } else {
            None
        };

        let charging_cell = cell(SchemaField::VehicleCharging);
        let vehicle_charging = charging_cell.eq_ignore_case("yes")
            || charging_cell.eq_ignore_case("true")
            || matches!(battery_level, Some(Number::Value(level)) if level > 0.0);

        Self {
            vehicle_id: cell(SchemaField::VehicleId).as_str().to_string(),
            vehicle_name: cell(SchemaField::VehicleName).as_str().to_string(),
            lat: cell(SchemaField::Lat).number(),
            lon: cell(SchemaField::Lon).number(),
            date_time: cell(SchemaField::DateTime).as_str().to_string(),
            route_url: cell(SchemaField::RouteUrl).as_str().to_string(),
            vehicle_charging,
            speed_kmh: speed_or_zero(cell(SchemaField::SpeedKmh).number()),
            battery_level,
        }
    }

    /// Every constraint this row violates, in check order
    pub fn violations(&self) -> Vec<Violation> {
        let mut found = Vec::new();

        if self.vehicle_id.is_empty() {
            found.push(Violation::MissingVehicleId);
        }
        if self.vehicle_name.is_empty() {
            found.push(Violation::MissingVehicleName);
        }
        if !self.lat.is_within(-90.0, 90.0) {
            found.push(Violation::InvalidLatitude);
        }
        if !self.lon.is_within(-180.0, 180.0) {
            found.push(Violation::InvalidLongitude);
        }
        if !is_valid_timestamp(&self.date_time) {
            found.push(Violation::InvalidDateTime);
        }
        if self.route_url.is_empty() {
            found.push(Violation::MissingRouteUrl);
        } else if !self.route_url.starts_with("http") {
            found.push(Violation::InvalidRouteUrl);
        }
        if self.speed_kmh.is_nan() || self.speed_kmh < 0.0 {
            found.push(Violation::InvalidSpeed);
        }
        if let Some(level) = self.battery_level {
            if !level.is_within(0.0, 100.0) {
                found.push(Violation::InvalidBatteryLevel);
            }
        }

        found
    }
}

/// Speed falls back to zero when unset or unparseable; a parsed zero stays zero
fn speed_or_zero(speed: Number) -> f64 {
    speed.unwrap_or(0.0)
}

/// A single row-level constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum Violation {
    #[error("Vehicle ID is required")]
    MissingVehicleId,
    #[error("Vehicle Name is required")]
    MissingVehicleName,
    #[error("Invalid latitude value")]
    InvalidLatitude,
    #[error("Invalid longitude value")]
    InvalidLongitude,
    #[error("Invalid date/time format")]
    InvalidDateTime,
    #[error("Route URL is required")]
    MissingRouteUrl,
    #[error("Invalid route URL format")]
    InvalidRouteUrl,
    #[error("Invalid speed value")]
    InvalidSpeed,
    #[error("Invalid battery level (should be between 0 and 100)")]
    InvalidBatteryLevel,
}

impl Violation {
    /// Field the violation is about
    pub fn field(&self) -> SchemaField {
        match self {
            Violation::MissingVehicleId => SchemaField::VehicleId,
            Violation::MissingVehicleName => SchemaField::VehicleName,
            Violation::InvalidLatitude => SchemaField::Lat,
            Violation::InvalidLongitude => SchemaField::Lon,
            Violation::InvalidDateTime => SchemaField::DateTime,
            Violation::MissingRouteUrl | Violation::InvalidRouteUrl => SchemaField::RouteUrl,
            Violation::InvalidSpeed => SchemaField::SpeedKmh,
            Violation::InvalidBatteryLevel => SchemaField::BatteryLevel,
        }
    }
}

/// A violation located at a 1-based data row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("Row {row}: {violation}")]
pub struct RowError {
    pub row: usize,
    pub violation: Violation,
}

/// Result of one normalization pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Normalized {
    pub rows: Vec<TypedRow>,
    pub errors: Vec<RowError>,
}

impl Normalized {
    /// Rendered error list, one line per violation
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Indices (0-based) of rows with at least one violation
    pub fn failing_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.errors.iter().map(|e| e.row - 1).collect();
        rows.dedup();
        rows
    }
}

/// Validate typed rows, collecting every violation of every row
pub fn validate(rows: &[TypedRow]) -> Vec<RowError> {
    rows.iter()
        .enumerate()
        .flat_map(|(index, row)| {
            row.violations()
                .into_iter()
                .map(move |violation| RowError {
                    row: index + 1,
                    violation,
                })
        })
        .collect()
}

/// Normalize and validate `raw_rows` under `mapping`.
///
/// Callers are expected to pass a complete mapping. An incomplete one does
/// not panic: unset fields read as empty and surface as validation errors.
pub fn normalize(raw_rows: &[RawRow], mapping: &FieldMapping) -> Normalized {
    let rows: Vec<TypedRow> = raw_rows
        .iter()
        .map(|raw| TypedRow::from_raw(raw, mapping))
        .collect();
    let errors = validate(&rows);

    debug!(
        rows = rows.len(),
        errors = errors.len(),
        "normalized upload rows"
    );

    Normalized { rows, errors }
}
