//! Submission of a completed onboarding to a store
//!
//! The payload is the boundary shape: snake_case keys, typed rows under
//! `data` and the column mapping under `mapping`, next to the onboarding
//! metadata and the submitting user.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use ulid::Ulid;

use crate::core::cell::Number;
use crate::core::field::SchemaField;
use crate::core::mapping::FieldMapping;
use crate::core::normalize::TypedRow;
use crate::core::onboarding::{OnboardingForm, Step};
use crate::core::session::ConfirmedUpload;

/// A typed row as it crosses the submission boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmittedRow {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub lat: Number,
    pub lon: Number,
    pub date_time: String,
    pub route_url: String,
    pub vehicle_charging: bool,
    /// Non-finite speeds cross JSON as `null` and read back as invalid
    pub speed_kmh: Number,
    pub battery_level: Option<Number>,
}

impl From<&TypedRow> for SubmittedRow {
    fn from(row: &TypedRow) -> Self {
        Self {
            vehicle_id: row.vehicle_id.clone(),
            vehicle_name: row.vehicle_name.clone(),
            lat: row.lat,
            lon: row.lon,
            date_time: row.date_time.clone(),
            route_url: row.route_url.clone(),
            vehicle_charging: row.vehicle_charging,
            speed_kmh: Number::Value(row.speed_kmh),
            battery_level: row.battery_level,
        }
    }
}

/// Mapping keyed by snake_case field name; unset fields map to ""
pub fn boundary_mapping(mapping: &FieldMapping) -> BTreeMap<String, String> {
    SchemaField::all()
        .iter()
        .map(|f| {
            (
                f.snake_case().to_string(),
                mapping.get(*f).unwrap_or_default().to_string(),
            )
        })
        .collect()
}

/// The uploaded file a submission came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub sha256: String,
}

/// Everything sent when onboarding completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub document_id: String,
    pub submitted_at: DateTime<Utc>,
    pub user: String,
    pub onboarding: OnboardingForm,
    pub source: SourceFile,
    pub data: Vec<SubmittedRow>,
    pub mapping: BTreeMap<String, String>,
}

impl SubmissionPayload {
    /// Build a payload from a completed form.
    ///
    /// Fails when any wizard step is still incomplete.
    pub fn from_form(user: impl Into<String>, form: &OnboardingForm) -> Result<Self, SubmitError> {
        if let Some(problem) = Step::all()
            .iter()
            .flat_map(|step| form.validate_step(*step))
            .next()
        {
            return Err(SubmitError::NotReady(problem.to_string()));
        }
        let upload = form
            .upload
            .as_ref()
            .ok_or_else(|| SubmitError::NotReady("Please upload a CSV file".to_string()))?;
        Ok(Self::new(user, form, upload))
    }

    /// Build a payload for `upload`, tagging it with a fresh document id
    pub fn new(user: impl Into<String>, form: &OnboardingForm, upload: &ConfirmedUpload) -> Self {
        Self {
            document_id: Ulid::new().to_string(),
            submitted_at: Utc::now(),
            user: user.into(),
            onboarding: form.with_upload(None),
            source: SourceFile {
                name: upload.file_name.clone(),
                sha256: upload.digest.clone(),
            },
            data: upload.rows.iter().map(SubmittedRow::from).collect(),
            mapping: boundary_mapping(&upload.mapping),
        }
    }
}

/// What a submitter reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub document_id: String,
    pub rows_stored: usize,
    pub destination: String,
}

/// Destination for completed onboardings
pub trait Submitter {
    fn submit(&mut self, payload: &SubmissionPayload) -> Result<SubmitReceipt, SubmitError>;
}

/// Errors that can occur while submitting
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("onboarding is not ready to submit: {0}")]
    NotReady(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("could not write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// SQLite-backed store: one `vehicle_data` row per telemetry row, tagged
/// with the submission's document id
pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self, SubmitError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SubmitError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            location: path.display().to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, SubmitError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            location: ":memory:".to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), SubmitError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS onboarding_submissions (
                document_id TEXT PRIMARY KEY,
                submitted_at TEXT NOT NULL,
                user TEXT NOT NULL,
                company_name TEXT NOT NULL,
                fleet_size TEXT NOT NULL,
                vehicle_types TEXT NOT NULL,
                vehicle_models TEXT NOT NULL,
                preferred_manufacturers TEXT NOT NULL,
                energy_cost TEXT NOT NULL,
                department TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_sha256 TEXT NOT NULL,
                mapping TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vehicle_data (
                document_id TEXT NOT NULL,
                vehicle_id TEXT NOT NULL,
                vehicle_name TEXT NOT NULL,
                lat REAL,
                lon REAL,
                date_time TEXT NOT NULL,
                route_url TEXT NOT NULL,
                vehicle_charging INTEGER NOT NULL,
                speed_kmh REAL,
                battery_level REAL
            );
            CREATE INDEX IF NOT EXISTS idx_vehicle_data_document ON vehicle_data(document_id);
            CREATE INDEX IF NOT EXISTS idx_vehicle_data_vehicle ON vehicle_data(vehicle_id);
            "#,
        )?;
        Ok(())
    }

    /// Number of telemetry rows stored for `document_id`
    pub fn row_count(&self, document_id: &str) -> Result<usize, SubmitError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM vehicle_data WHERE document_id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Telemetry rows stored for `document_id`, in insertion order
    pub fn rows(&self, document_id: &str) -> Result<Vec<SubmittedRow>, SubmitError> {
        let mut stmt = self.conn.prepare(
            "SELECT vehicle_id, vehicle_name, lat, lon, date_time, route_url,
                    vehicle_charging, speed_kmh, battery_level
             FROM vehicle_data WHERE document_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![document_id], |row| {
                let lat: Option<f64> = row.get(2)?;
                let lon: Option<f64> = row.get(3)?;
                let speed: Option<f64> = row.get(7)?;
                let battery: Option<f64> = row.get(8)?;
                Ok(SubmittedRow {
                    vehicle_id: row.get(0)?,
                    vehicle_name: row.get(1)?,
                    lat: lat.map(Number::Value).unwrap_or(Number::Invalid),
                    lon: lon.map(Number::Value).unwrap_or(Number::Invalid),
                    date_time: row.get(4)?,
                    route_url: row.get(5)?,
                    vehicle_charging: row.get(6)?,
                    speed_kmh: speed.map(Number::Value).unwrap_or(Number::Invalid),
                    battery_level: battery.map(Number::Value),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Document ids of all stored submissions, oldest first
    pub fn document_ids(&self) -> Result<Vec<String>, SubmitError> {
        let mut stmt = self
            .conn
            .prepare("SELECT document_id FROM onboarding_submissions ORDER BY submitted_at")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

impl Submitter for SqliteStore {
    fn submit(&mut self, payload: &SubmissionPayload) -> Result<SubmitReceipt, SubmitError> {
        let form = &payload.onboarding;
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO onboarding_submissions (
                document_id, submitted_at, user, company_name, fleet_size,
                vehicle_types, vehicle_models, preferred_manufacturers,
                energy_cost, department, file_name, file_sha256, mapping
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                payload.document_id,
                payload.submitted_at.to_rfc3339(),
                payload.user,
                form.company_name,
                form.fleet_size,
                serde_json::to_string(&form.vehicle_types)?,
                serde_json::to_string(&form.vehicle_models)?,
                serde_json::to_string(&form.preferred_manufacturers)?,
                form.energy_cost,
                form.department,
                payload.source.name,
                payload.source.sha256,
                serde_json::to_string(&payload.mapping)?,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO vehicle_data (
                    document_id, vehicle_id, vehicle_name, lat, lon, date_time,
                    route_url, vehicle_charging, speed_kmh, battery_level
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in &payload.data {
                stmt.execute(params![
                    payload.document_id,
                    row.vehicle_id,
                    row.vehicle_name,
                    row.lat.value(),
                    row.lon.value(),
                    row.date_time,
                    row.route_url,
                    row.vehicle_charging,
                    row.speed_kmh.value(),
                    row.battery_level.and_then(|b| b.value()),
                ])?;
            }
        }

        tx.commit()?;

        info!(
            document_id = %payload.document_id,
            rows = payload.data.len(),
            store = %self.location,
            "stored onboarding submission"
        );

        Ok(SubmitReceipt {
            document_id: payload.document_id.clone(),
            rows_stored: payload.data.len(),
            destination: self.location.clone(),
        })
    }
}

/// Writes the payload as pretty-printed JSON
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Submitter for JsonFileSink {
    fn submit(&mut self, payload: &SubmissionPayload) -> Result<SubmitReceipt, SubmitError> {
        let json = serde_json::to_string_pretty(payload)?;
        std::fs::write(&self.path, json).map_err(|source| SubmitError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "wrote submission payload");

        Ok(SubmitReceipt {
            document_id: payload.document_id.clone(),
            rows_stored: payload.data.len(),
            destination: self.path.display().to_string(),
        })
    }
}
