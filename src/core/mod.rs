//! Core module - the upload pipeline and the onboarding model

pub mod cell;
pub mod config;
pub mod field;
pub mod mapping;
pub mod normalize;
pub mod onboarding;
pub mod session;
pub mod submission;
pub mod timestamp;
pub mod upload;

pub use cell::{Cell, Number};
pub use config::Config;
pub use field::{FieldParseError, SchemaField};
pub use mapping::{is_complete, map_columns, FieldMapping, MappingError};
pub use normalize::{normalize, validate, Normalized, RawRow, RowError, TypedRow, Violation};
pub use onboarding::{OnboardingForm, Step, Wizard};
pub use session::{reduce, ConfirmedUpload, SessionState, UploadAction};
pub use submission::{
    JsonFileSink, SqliteStore, SubmissionPayload, SubmitError, SubmitReceipt, Submitter,
};
pub use timestamp::{detect_date_format, is_valid_timestamp, DateFormat};
pub use upload::{Upload, UploadError};
