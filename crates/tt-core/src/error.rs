//! # AppError
//!
//! Centralized error handling for the Trace of the Tides workspace.
//! Maps domain-specific failures to actionable error kinds; the HTTP layer
//! turns each kind into a status code.

use thiserror::Error;

use crate::content::ContentError;
use crate::editor::EditError;

/// The primary error type for all tt-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Document, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., malformed block payload, empty title)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No usable session was presented.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A session was presented but lacks ownership or role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate slug)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// A specialized Result type for Trace of the Tides logic.
pub type Result<T> = std::result::Result<T, AppError>;
