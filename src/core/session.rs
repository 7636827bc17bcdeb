//! Upload-step state as an immutable snapshot with a reducer
//!
//! Every user action (file dropped, parse failed, mapping edited, file
//! replaced) is an [`UploadAction`]. [`reduce`] takes the current
//! [`SessionState`] and returns the next one without touching the input.
//! Typed rows exist in a state only while its mapping is complete.

use tracing::debug;

use crate::core::field::SchemaField;
use crate::core::mapping::{map_columns, FieldMapping};
use crate::core::normalize::{normalize, Normalized, TypedRow};
use crate::core::upload::Upload;

/// Actions the upload step reacts to
#[derive(Debug, Clone)]
pub enum UploadAction {
    /// A file was parsed successfully
    Uploaded(Upload),
    /// A file could not be parsed
    UploadFailed(String),
    /// The user bound a field to a column, or unset it
    MappingChanged(SchemaField, Option<String>),
    /// The user chose to upload a different file
    Replaced,
}

/// Snapshot of the upload step
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    upload: Option<Upload>,
    mapping: FieldMapping,
    preview: Option<Normalized>,
    mapping_open: bool,
    failure: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    /// Headers of the current upload; empty when nothing parsed
    pub fn headers(&self) -> &[String] {
        self.upload.as_ref().map(|u| u.headers()).unwrap_or(&[])
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Typed rows and errors for the current mapping, if it is complete
    pub fn preview(&self) -> Option<&Normalized> {
        self.preview.as_ref()
    }

    /// Whether the column mapping dialog should be shown
    pub fn mapping_open(&self) -> bool {
        self.mapping_open
    }

    /// Message of the last failed parse
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Confirm is allowed once the mapping is complete and no row has errors
    pub fn can_confirm(&self) -> bool {
        self.mapping.is_complete() && self.preview.as_ref().is_some_and(|p| p.is_clean())
    }

    /// Rows and mapping handed to the rest of the wizard on confirm
    pub fn confirm(&self) -> Option<ConfirmedUpload> {
        if !self.can_confirm() {
            return None;
        }
        let upload = self.upload.as_ref()?;
        let preview = self.preview.as_ref()?;
        Some(ConfirmedUpload {
            file_name: upload.name().to_string(),
            digest: upload.digest().to_string(),
            rows: preview.rows.clone(),
            mapping: self.mapping.clone(),
        })
    }
}

/// The result of a confirmed mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedUpload {
    pub file_name: String,
    pub digest: String,
    pub rows: Vec<TypedRow>,
    pub mapping: FieldMapping,
}

/// Normalize only when the mapping is complete
fn preview_for(upload: Option<&Upload>, mapping: &FieldMapping) -> Option<Normalized> {
    match upload {
        Some(upload) if mapping.is_complete() => Some(normalize(upload.rows(), mapping)),
        _ => None,
    }
}

/// Compute the next state for `action`
pub fn reduce(state: &SessionState, action: UploadAction) -> SessionState {
    match action {
        UploadAction::Uploaded(upload) => {
            let mapping = map_columns(upload.headers());
            let preview = preview_for(Some(&upload), &mapping);
            debug!(
                file = upload.name(),
                complete = mapping.is_complete(),
                "upload received"
            );
            SessionState {
                upload: Some(upload),
                mapping,
                preview,
                mapping_open: true,
                failure: None,
            }
        }
        UploadAction::UploadFailed(message) => {
            debug!(%message, "upload failed to parse");
            SessionState {
                mapping_open: true,
                failure: Some(message),
                ..SessionState::default()
            }
        }
        UploadAction::MappingChanged(field, column) => {
            let mapping = state.mapping.with(field, column.as_deref());
            let preview = preview_for(state.upload.as_ref(), &mapping);
            SessionState {
                upload: state.upload.clone(),
                mapping,
                preview,
                mapping_open: state.mapping_open,
                failure: state.failure.clone(),
            }
        }
        UploadAction::Replaced => SessionState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Vehicle ID,Vehicle Name,Lat,Lon,DateTime,Route URL,Speed,Battery Level\n\
                       V1,Truck A,40.0,-75.0,2024-01-01 08:00:00,https://x.test/r1,60,45\n";

    fn uploaded() -> SessionState {
        let upload = Upload::from_bytes("fleet.csv", CSV.as_bytes()).unwrap();
        reduce(&SessionState::new(), UploadAction::Uploaded(upload))
    }

    #[test]
    fn test_upload_auto_maps_and_previews() {
        let state = uploaded();
        assert!(state.mapping_open());
        assert!(state.mapping().is_complete());
        assert_eq!(state.preview().unwrap().rows.len(), 1);
        assert!(state.can_confirm());
    }

    #[test]
    fn test_incomplete_mapping_drops_preview() {
        let state = uploaded();
        let next = reduce(&state, UploadAction::MappingChanged(SchemaField::Lat, None));
        assert!(next.preview().is_none());
        assert!(!next.can_confirm());
        assert!(next.confirm().is_none());
        // The previous snapshot is untouched
        assert!(state.preview().is_some());
    }

    #[test]
    fn test_remapping_replaces_preview() {
        let state = uploaded();
        let broken = reduce(
            &state,
            UploadAction::MappingChanged(SchemaField::Lat, Some("Vehicle Name".into())),
        );
        assert_eq!(
            broken.preview().unwrap().messages(),
            vec!["Row 1: Invalid latitude value"]
        );
        assert!(!broken.can_confirm());

        let fixed = reduce(
            &broken,
            UploadAction::MappingChanged(SchemaField::Lat, Some("Lat".into())),
        );
        assert!(fixed.preview().unwrap().is_clean());
        assert!(fixed.can_confirm());
    }

    #[test]
    fn test_parse_failure_opens_empty_mapping() {
        let state = reduce(&uploaded(), UploadAction::UploadFailed("bad file".into()));
        assert!(state.mapping_open());
        assert!(state.headers().is_empty());
        assert!(state.upload().is_none());
        assert_eq!(state.failure(), Some("bad file"));
        assert_eq!(state.mapping(), &FieldMapping::new());
    }

    #[test]
    fn test_mapping_edit_without_upload_has_no_rows() {
        let mut state = SessionState::new();
        for field in SchemaField::required() {
            state = reduce(&state, UploadAction::MappingChanged(field, Some("x".into())));
        }
        assert!(state.mapping().is_complete());
        assert!(state.preview().is_none());
    }

    #[test]
    fn test_replace_discards_everything() {
        let state = reduce(&uploaded(), UploadAction::Replaced);
        assert!(state.upload().is_none());
        assert!(state.preview().is_none());
        assert!(!state.mapping_open());
        assert_eq!(state.mapping(), &FieldMapping::new());
    }

    #[test]
    fn test_confirm_carries_rows_and_mapping() {
        let confirmed = uploaded().confirm().unwrap();
        assert_eq!(confirmed.file_name, "fleet.csv");
        assert_eq!(confirmed.rows.len(), 1);
        assert_eq!(confirmed.mapping.get(SchemaField::SpeedKmh), Some("Speed"));
    }
}
