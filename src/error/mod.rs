//! Error types and handling for `bugboard`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for bootstrap code
//! - Provides recovery hints for user-facing errors
//! - Maps onto stable error codes, HTTP statuses and exit codes via
//!   [`StructuredError`]

mod structured;

pub use structured::{ErrorCode, StructuredError};

use thiserror::Error;

/// Primary error type for `bugboard` operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    // === Lookup Errors ===
    /// Project with the specified ID was not found.
    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {}", format_validation_errors(.errors))]
    ValidationErrors { errors: Vec<ValidationError> },

    /// Invalid status value.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    /// Invalid priority value.
    #[error("Invalid priority: {priority}")]
    InvalidPriority { priority: String },

    /// Invalid issue type value.
    #[error("Invalid issue type: {issue_type}")]
    InvalidType { issue_type: String },

    // === Storage Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TrackerError {
    /// Is this a "does not exist" error?
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. } | Self::IssueNotFound { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ProjectNotFound { .. } => Some("List projects with: bugboard projects"),
            Self::InvalidStatus { .. } => {
                Some("Valid statuses are: TO_DO, IN_PROGRESS, IN_REVIEW, DONE")
            }
            Self::InvalidPriority { .. } => {
                Some("Valid priorities are: LOW, MEDIUM, HIGH, CRITICAL")
            }
            Self::InvalidType { .. } => {
                Some("Valid types are: TASK, BUG, FEATURE, STORY, EPIC")
            }
            Self::Config(_) => Some("Check bugboard.yaml and BUGBOARD_* environment variables"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create from multiple validation errors.
    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::ProjectNotFound {
            id: "p-404".to_string(),
        };
        assert_eq!(err.to_string(), "Project not found: p-404");
    }

    #[test]
    fn test_validation_error() {
        let err = TrackerError::validation("title", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: title: cannot be empty");
    }

    #[test]
    fn test_multiple_validation_errors_display() {
        let err = TrackerError::from_validation_errors(vec![
            ValidationError::new("title", "cannot be empty"),
            ValidationError::new("name", "exceeds 200 characters"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation errors: title: cannot be empty; name: exceeds 200 characters"
        );
    }

    #[test]
    fn test_single_validation_error_collapses() {
        let err =
            TrackerError::from_validation_errors(vec![ValidationError::new("title", "too long")]);
        assert!(matches!(err, TrackerError::Validation { .. }));
    }

    #[test]
    fn test_not_found() {
        let err = TrackerError::IssueNotFound {
            id: "i-1".to_string(),
        };
        assert!(err.is_not_found());

        let db = TrackerError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            None,
        ));
        assert!(!db.is_not_found());
    }

    #[test]
    fn test_suggestion() {
        let err = TrackerError::InvalidStatus {
            status: "closed".to_string(),
        };
        assert_eq!(
            err.suggestion(),
            Some("Valid statuses are: TO_DO, IN_PROGRESS, IN_REVIEW, DONE")
        );
        let err = TrackerError::IssueNotFound { id: "x".into() };
        assert_eq!(err.suggestion(), None);
    }
}
