//! Semantic vehicle-data fields that CSV columns are mapped onto

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed set of fields a telemetry upload is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaField {
    /// Vehicle identifier
    VehicleId,
    /// Human-readable vehicle name
    VehicleName,
    /// Latitude in degrees
    Lat,
    /// Longitude in degrees
    Lon,
    /// Observation timestamp
    DateTime,
    /// Link to the route the vehicle is on
    RouteUrl,
    /// Whether the vehicle is charging
    VehicleCharging,
    /// Speed in km/h
    SpeedKmh,
    /// Battery level in percent
    BatteryLevel,
}

impl SchemaField {
    /// Internal (camelCase) name
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaField::VehicleId => "vehicleId",
            SchemaField::VehicleName => "vehicleName",
            SchemaField::Lat => "lat",
            SchemaField::Lon => "lon",
            SchemaField::DateTime => "dateTime",
            SchemaField::RouteUrl => "routeUrl",
            SchemaField::VehicleCharging => "vehicleCharging",
            SchemaField::SpeedKmh => "speedKmh",
            SchemaField::BatteryLevel => "batteryLevel",
        }
    }

    /// Name used when the field crosses the submission boundary
    pub fn snake_case(&self) -> &'static str {
        match self {
            SchemaField::VehicleId => "vehicle_id",
            SchemaField::VehicleName => "vehicle_name",
            SchemaField::Lat => "lat",
            SchemaField::Lon => "lon",
            SchemaField::DateTime => "date_time",
            SchemaField::RouteUrl => "route_url",
            SchemaField::VehicleCharging => "vehicle_charging",
            SchemaField::SpeedKmh => "speed_kmh",
            SchemaField::BatteryLevel => "battery_level",
        }
    }

    /// Label shown next to the column picker
    pub fn label(&self) -> &'static str {
        match self {
            SchemaField::VehicleId => "Vehicle Id",
            SchemaField::VehicleName => "Vehicle Name",
            SchemaField::Lat => "Lat",
            SchemaField::Lon => "Lon",
            SchemaField::DateTime => "Date Time",
            SchemaField::RouteUrl => "Route Url",
            SchemaField::VehicleCharging => "Vehicle Charging",
            SchemaField::SpeedKmh => "Speed Kmh",
            SchemaField::BatteryLevel => "Battery Level",
        }
    }

    /// Whether a column must be bound before rows can be normalized.
    /// Speed is optional and falls back to zero when unset.
    pub fn is_required(&self) -> bool {
        !matches!(
            self,
            SchemaField::VehicleCharging | SchemaField::SpeedKmh | SchemaField::BatteryLevel
        )
    }

    /// All fields, in mapping-dialog order
    pub fn all() -> &'static [SchemaField] {
        &[
            SchemaField::VehicleId,
            SchemaField::VehicleName,
            SchemaField::Lat,
            SchemaField::Lon,
            SchemaField::DateTime,
            SchemaField::RouteUrl,
            SchemaField::VehicleCharging,
            SchemaField::SpeedKmh,
            SchemaField::BatteryLevel,
        ]
    }

    /// The six fields that make a mapping complete
    pub fn required() -> impl Iterator<Item = SchemaField> {
        Self::all().iter().copied().filter(|f| f.is_required())
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SchemaField {
    type Err = FieldParseError;

    /// Accepts the camelCase name, the snake_case name, or a few short aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "vehicleid" | "id" => Ok(SchemaField::VehicleId),
            "vehiclename" | "name" => Ok(SchemaField::VehicleName),
            "lat" | "latitude" => Ok(SchemaField::Lat),
            "lon" | "lng" | "longitude" => Ok(SchemaField::Lon),
            "datetime" | "timestamp" => Ok(SchemaField::DateTime),
            "routeurl" | "route" => Ok(SchemaField::RouteUrl),
            "vehiclecharging" | "charging" => Ok(SchemaField::VehicleCharging),
            "speedkmh" | "speed" => Ok(SchemaField::SpeedKmh),
            "batterylevel" | "battery" => Ok(SchemaField::BatteryLevel),
            _ => Err(FieldParseError::Unknown(s.to_string())),
        }
    }
}

/// Errors that can occur when parsing a field name
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldParseError {
    #[error("unknown field: '{0}' (valid: vehicleId, vehicleName, lat, lon, dateTime, routeUrl, vehicleCharging, speedKmh, batteryLevel)")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_fields_are_required() {
        let required: Vec<_> = SchemaField::required().collect();
        assert_eq!(
            required,
            vec![
                SchemaField::VehicleId,
                SchemaField::VehicleName,
                SchemaField::Lat,
                SchemaField::Lon,
                SchemaField::DateTime,
                SchemaField::RouteUrl,
            ]
        );
    }

    #[test]
    fn test_parse_accepts_both_casings() {
        assert_eq!("vehicleId".parse::<SchemaField>().unwrap(), SchemaField::VehicleId);
        assert_eq!("vehicle_id".parse::<SchemaField>().unwrap(), SchemaField::VehicleId);
        assert_eq!("battery-level".parse::<SchemaField>().unwrap(), SchemaField::BatteryLevel);
        assert_eq!("SPEED_KMH".parse::<SchemaField>().unwrap(), SchemaField::SpeedKmh);
    }

    #[test]
    fn test_parse_unknown_field() {
        let err = "altitude".parse::<SchemaField>().unwrap_err();
        assert!(err.to_string().contains("altitude"));
    }

    #[test]
    fn test_names_round_trip() {
        for field in SchemaField::all() {
            assert_eq!(field.as_str().parse::<SchemaField>().unwrap(), *field);
            assert_eq!(field.snake_case().parse::<SchemaField>().unwrap(), *field);
        }
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&SchemaField::SpeedKmh).unwrap();
        assert_eq!(json, "\"speedKmh\"");
    }
}
