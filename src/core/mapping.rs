//! Column mapping: binding CSV headers to schema fields
//!
//! Automatic mapping walks the header row once. Each header is lowercased
//! and tested against an ordered rule table; the first rule that matches
//! decides the header's field and a header binds at most one field. When
//! several headers match the same field, the later header wins.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::field::{FieldParseError, SchemaField};

/// Binding from each schema field to a source column (or unset)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMapping {
    pub vehicle_id: Option<String>,
    pub vehicle_name: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub date_time: Option<String>,
    pub route_url: Option<String>,
    pub vehicle_charging: Option<String>,
    pub speed_kmh: Option<String>,
    pub battery_level: Option<String>,
}

impl FieldMapping {
    /// Mapping with every slot unset
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: SchemaField) -> &Option<String> {
        match field {
            SchemaField::VehicleId => &self.vehicle_id,
            SchemaField::VehicleName => &self.vehicle_name,
            SchemaField::Lat => &self.lat,
            SchemaField::Lon => &self.lon,
            SchemaField::DateTime => &self.date_time,
            SchemaField::RouteUrl => &self.route_url,
            SchemaField::VehicleCharging => &self.vehicle_charging,
            SchemaField::SpeedKmh => &self.speed_kmh,
            SchemaField::BatteryLevel => &self.battery_level,
        }
    }

    fn slot_mut(&mut self, field: SchemaField) -> &mut Option<String> {
        match field {
            SchemaField::VehicleId => &mut self.vehicle_id,
            SchemaField::VehicleName => &mut self.vehicle_name,
            SchemaField::Lat => &mut self.lat,
            SchemaField::Lon => &mut self.lon,
            SchemaField::DateTime => &mut self.date_time,
            SchemaField::RouteUrl => &mut self.route_url,
            SchemaField::VehicleCharging => &mut self.vehicle_charging,
            SchemaField::SpeedKmh => &mut self.speed_kmh,
            SchemaField::BatteryLevel => &mut self.battery_level,
        }
    }

    /// Column bound to `field`. An empty column name counts as unset.
    pub fn get(&self, field: SchemaField) -> Option<&str> {
        self.slot(field).as_deref().filter(|c| !c.is_empty())
    }

    /// Bind `field` to `column`, replacing any previous binding
    pub fn set(&mut self, field: SchemaField, column: impl Into<String>) {
        let column = column.into();
        *self.slot_mut(field) = if column.is_empty() { None } else { Some(column) };
    }

    /// Unset `field`
    pub fn clear(&mut self, field: SchemaField) {
        *self.slot_mut(field) = None;
    }

    /// Copy of this mapping with `field` bound to `column` (or unset for `None`)
    pub fn with(&self, field: SchemaField, column: Option<&str>) -> Self {
        let mut next = self.clone();
        match column {
            Some(c) => next.set(field, c),
            None => next.clear(field),
        }
        next
    }

    /// True iff every required field is bound to a non-empty column
    pub fn is_complete(&self) -> bool {
        SchemaField::required().all(|f| self.get(f).is_some())
    }

    /// Required fields still unbound, in dialog order
    pub fn missing_required(&self) -> Vec<SchemaField> {
        SchemaField::required()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Bound fields and their columns, in dialog order
    pub fn bound_columns(&self) -> Vec<(SchemaField, &str)> {
        SchemaField::all()
            .iter()
            .filter_map(|f| self.get(*f).map(|c| (*f, c)))
            .collect()
    }

    /// Headers no field is bound to
    pub fn unmapped_headers<'h, S: AsRef<str>>(&self, headers: &'h [S]) -> Vec<&'h str> {
        let bound: Vec<&str> = self.bound_columns().into_iter().map(|(_, c)| c).collect();
        headers
            .iter()
            .map(|h| h.as_ref())
            .filter(|h| !bound.contains(h))
            .collect()
    }

    /// Apply `field=column` overrides on top of this mapping.
    ///
    /// `field=` unsets the field. Columns must exist in `headers`.
    pub fn apply_overrides<S: AsRef<str>>(
        &self,
        overrides: &[String],
        headers: &[S],
    ) -> Result<Self, MappingError> {
        let mut next = self.clone();

        for entry in overrides {
            let (field_str, column) = entry
                .split_once('=')
                .ok_or_else(|| MappingError::MalformedOverride(entry.clone()))?;
            let field: SchemaField = field_str.parse()?;
            let column = column.trim();

            if column.is_empty() {
                next.clear(field);
                continue;
            }

            if !headers.iter().any(|h| h.as_ref() == column) {
                return Err(MappingError::UnknownColumn {
                    field,
                    column: column.to_string(),
                });
            }
            next.set(field, column);
        }

        Ok(next)
    }
}

/// Errors raised while editing a mapping by hand
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("malformed mapping override '{0}' (expected field=column)")]
    MalformedOverride(String),

    #[error(transparent)]
    UnknownField(#[from] FieldParseError),

    #[error("column '{column}' for {field} is not in the CSV header row")]
    UnknownColumn { field: SchemaField, column: String },
}

/// One entry of the header matching table
struct MatchRule {
    field: SchemaField,
    matches: fn(&str) -> bool,
}

fn is_vehicle_id(h: &str) -> bool {
    h.contains("vehicle") && h.contains("id")
}

fn is_vehicle_name(h: &str) -> bool {
    h.contains("vehicle") && h.contains("name")
}

fn is_latitude(h: &str) -> bool {
    h == "lat" || h == "latitude"
}

fn is_longitude(h: &str) -> bool {
    h == "lon" || h == "longitude"
}

fn is_date_time(h: &str) -> bool {
    h.contains("date") || h.contains("time")
}

fn is_route_url(h: &str) -> bool {
    h.contains("route") && h.contains("url")
}

fn is_charging(h: &str) -> bool {
    h.contains("charging")
}

fn is_speed(h: &str) -> bool {
    h.contains("speed")
}

fn is_battery_level(h: &str) -> bool {
    h.contains("battery") && h.contains("level")
}

/// Priority order matters: a header is claimed by the first matching rule.
const RULES: &[MatchRule] = &[
    MatchRule { field: SchemaField::VehicleId, matches: is_vehicle_id },
    MatchRule { field: SchemaField::VehicleName, matches: is_vehicle_name },
    MatchRule { field: SchemaField::Lat, matches: is_latitude },
    MatchRule { field: SchemaField::Lon, matches: is_longitude },
    MatchRule { field: SchemaField::DateTime, matches: is_date_time },
    MatchRule { field: SchemaField::RouteUrl, matches: is_route_url },
    MatchRule { field: SchemaField::VehicleCharging, matches: is_charging },
    MatchRule { field: SchemaField::SpeedKmh, matches: is_speed },
    MatchRule { field: SchemaField::BatteryLevel, matches: is_battery_level },
];

/// Field a single header would be mapped to, if any
pub fn match_header(header: &str) -> Option<SchemaField> {
    let lower = header.to_lowercase();
    RULES
        .iter()
        .find(|rule| (rule.matches)(&lower))
        .map(|rule| rule.field)
}

/// Guess a mapping from the CSV header row
pub fn map_columns<S: AsRef<str>>(headers: &[S]) -> FieldMapping {
    let mut mapping = FieldMapping::new();

    for header in headers {
        let header = header.as_ref();
        if let Some(field) = match_header(header) {
            mapping.set(field, header);
        }
    }

    debug!(
        headers = headers.len(),
        bound = mapping.bound_columns().len(),
        complete = mapping.is_complete(),
        "automatic column mapping"
    );

    mapping
}

/// Free-function form of [`FieldMapping::is_complete`]
pub fn is_complete(mapping: &FieldMapping) -> bool {
    mapping.is_complete()
}
