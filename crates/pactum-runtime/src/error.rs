//! User-facing stage errors.
//!
//! Every pipeline stage converts its own failures into a `StageError`. The
//! orchestrator relays the message verbatim and never retries on its own;
//! every kind is recoverable by the user acting again.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing document reference
    NotFound,
    /// The model or service failed to produce a valid extraction
    ExtractionFailed,
    /// A stage was requested before a contract was processed
    MissingInput,
    /// Anything else
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// A tagged stage failure carrying the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("{0}")]
    NotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("{0}")]
    MissingInput(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::NotFound(_) => ErrorKind::NotFound,
            StageError::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            StageError::MissingInput(_) => ErrorKind::MissingInput,
            StageError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub(crate) fn no_contract() -> Self {
        StageError::MissingInput(
            "No contract has been processed yet. Please upload a contract PDF first.".to_string(),
        )
    }
}
