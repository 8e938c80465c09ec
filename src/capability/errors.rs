//! # Capability Errors
//!
//! Every error is raised synchronously by the operation that detects it and
//! is never retried by the layer that raised it.

use std::io;

use thiserror::Error;

/// Result type for capability operations
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Capability errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    // Lookup errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a context: {0}")]
    NotAContext(String),

    #[error("Not a file record: {0}")]
    NotAFileRecord(String),

    // Creation errors
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Path conflict: {0} is a file")]
    PathConflict(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // Roundtrip
    #[error("Verification failed: {0} mismatched entries")]
    VerificationMismatch(usize),

    // Persisted state
    #[error("Corrupt document {path}: {reason}")]
    CorruptDocument { path: String, reason: String },

    #[error("Corrupt changelog {path} at line {line}: {reason}")]
    CorruptChangelog {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(String),
}

impl CapabilityError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CapabilityError::NotFound(_) => "MYC_NOT_FOUND",
            CapabilityError::NotAContext(_) => "MYC_NOT_A_CONTEXT",
            CapabilityError::NotAFileRecord(_) => "MYC_NOT_A_FILE_RECORD",
            CapabilityError::AlreadyExists(_) => "MYC_ALREADY_EXISTS",
            CapabilityError::PathConflict(_) => "MYC_PATH_CONFLICT",
            CapabilityError::InvalidPath(_) => "MYC_INVALID_PATH",
            CapabilityError::VerificationMismatch(_) => "MYC_VERIFICATION_MISMATCH",
            CapabilityError::CorruptDocument { .. } => "MYC_CORRUPT_DOCUMENT",
            CapabilityError::CorruptChangelog { .. } => "MYC_CORRUPT_CHANGELOG",
            CapabilityError::Io(_) => "MYC_IO_ERROR",
        }
    }

    /// True for errors that mean "nothing is there"
    pub fn is_not_found(&self) -> bool {
        matches!(self, CapabilityError::NotFound(_))
    }
}

impl From<io::Error> for CapabilityError {
    fn from(e: io::Error) -> Self {
        CapabilityError::Io(e.to_string())
    }
}
