//! Import errors.
//!
//! [`ImportError`] aborts a run; [`RecordError`] only fails one record.

use coursesync_core::{BackendError, ImportField};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File format is invalid: {0}")]
    InvalidFormat(String),

    #[error("Invalid Encoding Specified: {0}")]
    UnsupportedEncoding(String),

    #[error("Header mismatch: found {found} columns, at least {required} required")]
    HeaderMismatch { found: usize, required: usize },

    #[error("Category resolution failed: {0}")]
    CategoryResolution(String),

    #[error("No records found in source")]
    NoRecords,

    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing mandatory fields: {}", field_list(.0))]
    Validation(Vec<ImportField>),

    #[error("category not found: {0}")]
    Category(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RecordError {
    /// Status line reported for a record that failed this way.
    pub fn status(&self) -> String {
        match self {
            Self::Validation(_) => "Invalid Import Record".to_string(),
            Self::Category(_) => "Category Not Found".to_string(),
            Self::Backend(e) => format!("Persistence Error: {e}"),
        }
    }
}

fn field_list(fields: &[ImportField]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}
