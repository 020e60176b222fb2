//! Engine errors.

use thiserror::Error;

use formpilot_protocols::{BackendError, PageError};

/// A generated response could not be committed to a field.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Invalid checkbox response: {0:?} (expected yes/no, true/false, 1/0, on/off)")]
    InvalidCheckboxResponse(String),

    #[error("No radios found for group: {0}")]
    NoRadiosFound(String),

    #[error("Select has no options: {0}")]
    NoOptions(String),

    #[error("Page error: {0}")]
    Page(#[from] PageError),
}

/// Filling a single field failed.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("No field has focus")]
    NoActiveField,

    #[error("Element cannot be filled: {0}")]
    Unsupported(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Apply(#[from] ApplyError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),
}
