//! Reading an uploaded telemetry CSV into memory

use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::normalize::RawRow;

/// A parsed CSV upload: header row plus raw rows keyed by header
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    name: String,
    digest: String,
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl Upload {
    /// Read and parse a CSV file
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, &bytes)
    }

    /// Parse CSV bytes. The first record is the header row.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, UploadError> {
        let name = name.into();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let header_record = rdr.headers().map_err(UploadError::from_csv)?.clone();
        let headers = dedupe_headers(&header_record);
        if headers.iter().all(|h| h.is_empty()) {
            return Err(UploadError::NoHeaders);
        }
        debug!(file = %name, headers = ?headers, "detected CSV headers");

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(UploadError::from_csv)?;
            let row = RawRow::from_pairs(
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.as_str(), record.get(i).unwrap_or(""))),
            );
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(UploadError::NoData);
        }

        debug!(file = %name, rows = rows.len(), "parsed CSV upload");

        Ok(Self {
            name,
            digest: compute_digest(bytes),
            headers,
            rows,
        })
    }

    /// File name the upload came from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// SHA-256 of the uploaded bytes, hex encoded
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }
}

/// Give repeated header names a numeric suffix (`speed`, `speed_1`, ...)
/// so every column stays addressable by name.
fn dedupe_headers(record: &StringRecord) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(record.len());
    for raw in record.iter() {
        let mut candidate = raw.to_string();
        let mut suffix = 1;
        while headers.contains(&candidate) {
            candidate = format!("{}_{}", raw, suffix);
            suffix += 1;
        }
        headers.push(candidate);
    }
    headers
}

/// Compute SHA256 hash of content
fn compute_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Errors that can occur while reading an upload
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("CSV is not valid UTF-8 (line {line})")]
    InvalidUtf8 { line: u64 },

    #[error("CSV has no header row")]
    NoHeaders,

    #[error("No data found in CSV")]
    NoData,
}

impl UploadError {
    fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(1);
        match err.kind() {
            csv::ErrorKind::Utf8 { .. } => UploadError::InvalidUtf8 { line },
            _ => UploadError::Malformed {
                line,
                message: err.to_string(),
            },
        }
    }
}
