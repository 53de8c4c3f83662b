//! Structured error output for API clients and the CLI.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - HTTP status and process exit code per category
//! - Hints for self-correction (including "did you mean" for enum values)
//! - Retryability flags
//! - Context for debugging

#![allow(clippy::option_if_let_else)]

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === Lookup Errors (404, exit code 3) ===
    /// Project with specified ID not found
    ProjectNotFound,
    /// Issue with specified ID not found
    IssueNotFound,

    // === Validation Errors (400, exit code 4) ===
    /// Field validation failed
    ValidationFailed,
    /// Invalid status value
    InvalidStatus,
    /// Invalid priority value
    InvalidPriority,
    /// Invalid issue type value
    InvalidType,

    // === Database Errors (500, exit code 2) ===
    /// Database operation failed
    DatabaseError,

    // === Config Errors (500, exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (500, exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidPriority => "INVALID_PRIORITY",
            Self::InvalidType => "INVALID_TYPE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller might succeed by fixing the input and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed | Self::InvalidStatus | Self::InvalidPriority | Self::InvalidType
        )
    }

    /// HTTP status code for this error category.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::ProjectNotFound | Self::IssueNotFound => 404,
            Self::ValidationFailed
            | Self::InvalidStatus
            | Self::InvalidPriority
            | Self::InvalidType
            | Self::JsonError => 400,
            Self::DatabaseError
            | Self::ConfigError
            | Self::IoError
            | Self::YamlError
            | Self::InternalError => 500,
        }
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database errors
    /// - 3: Lookup errors
    /// - 4: Validation errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseError => 2,
            Self::ProjectNotFound | Self::IssueNotFound => 3,
            Self::ValidationFailed
            | Self::InvalidStatus
            | Self::InvalidPriority
            | Self::InvalidType => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `TrackerError`.
    #[must_use]
    pub fn from_error(err: &TrackerError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to the nested JSON envelope used by the CLI.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Serialize to the flat JSON body returned by the HTTP API.
    ///
    /// `error` carries the message so clients that only read `error` keep working.
    #[must_use]
    pub fn to_http_body(&self) -> Value {
        let mut body = json!({
            "error": self.message,
            "code": self.code.as_str(),
        });
        if let Some(hint) = &self.hint {
            body["hint"] = json!(hint);
        }
        if let Some(context) = &self.context {
            body["context"] = context.clone();
        }
        body
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &TrackerError) -> (ErrorCode, Option<Value>) {
        match err {
            TrackerError::ProjectNotFound { id } => {
                (ErrorCode::ProjectNotFound, Some(json!({"searched_id": id})))
            }
            TrackerError::IssueNotFound { id } => {
                (ErrorCode::IssueNotFound, Some(json!({"searched_id": id})))
            }
            TrackerError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            TrackerError::ValidationErrors { errors } => (
                ErrorCode::ValidationFailed,
                Some(json!({
                    "errors": errors.iter()
                        .map(|e| json!({"field": e.field, "message": e.message}))
                        .collect::<Vec<_>>()
                })),
            ),
            TrackerError::InvalidStatus { status } => (
                ErrorCode::InvalidStatus,
                Some(json!({"provided": status, "valid_values": VALID_STATUSES})),
            ),
            TrackerError::InvalidPriority { priority } => (
                ErrorCode::InvalidPriority,
                Some(json!({"provided": priority, "valid_values": VALID_PRIORITIES})),
            ),
            TrackerError::InvalidType { issue_type } => (
                ErrorCode::InvalidType,
                Some(json!({"provided": issue_type, "valid_values": VALID_TYPES})),
            ),
            TrackerError::Database(_) => (ErrorCode::DatabaseError, None),
            TrackerError::Config(_) => (ErrorCode::ConfigError, None),
            TrackerError::Io(_) => (ErrorCode::IoError, None),
            TrackerError::Json(_) => (ErrorCode::JsonError, None),
            TrackerError::Yaml(_) => (ErrorCode::YamlError, None),
            TrackerError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    /// Generate a context-aware hint, preferring "did you mean" over the generic list.
    fn generate_hint(err: &TrackerError) -> Option<String> {
        let detected = match err {
            TrackerError::InvalidStatus { status } => {
                detect_intent(status, &VALID_STATUSES, &STATUS_SYNONYMS)
            }
            TrackerError::InvalidPriority { priority } => {
                detect_intent(priority, &VALID_PRIORITIES, &PRIORITY_SYNONYMS)
            }
            TrackerError::InvalidType { issue_type } => {
                detect_intent(issue_type, &VALID_TYPES, &TYPE_SYNONYMS)
            }
            _ => None,
        };

        if let Some(detected) = detected {
            return Some(format!("Did you mean {detected}?"));
        }

        err.suggestion().map(ToString::to_string)
    }
}

// === Valid Values ===

const VALID_STATUSES: [&str; 4] = ["TO_DO", "IN_PROGRESS", "IN_REVIEW", "DONE"];
const VALID_PRIORITIES: [&str; 4] = ["LOW", "MEDIUM", "HIGH", "CRITICAL"];
const VALID_TYPES: [&str; 5] = ["TASK", "BUG", "FEATURE", "STORY", "EPIC"];

/// Status synonyms for intent detection.
static STATUS_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("open", "TO_DO"),
        ("new", "TO_DO"),
        ("backlog", "TO_DO"),
        ("pending", "TO_DO"),
        ("wip", "IN_PROGRESS"),
        ("doing", "IN_PROGRESS"),
        ("started", "IN_PROGRESS"),
        ("active", "IN_PROGRESS"),
        ("review", "IN_REVIEW"),
        ("reviewing", "IN_REVIEW"),
        ("qa", "IN_REVIEW"),
        ("closed", "DONE"),
        ("complete", "DONE"),
        ("completed", "DONE"),
        ("finished", "DONE"),
        ("resolved", "DONE"),
    ]
    .into_iter()
    .collect()
});

/// Priority synonyms for intent detection.
static PRIORITY_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("p0", "CRITICAL"),
        ("urgent", "CRITICAL"),
        ("blocker", "CRITICAL"),
        ("highest", "CRITICAL"),
        ("p1", "HIGH"),
        ("important", "HIGH"),
        ("p2", "MEDIUM"),
        ("normal", "MEDIUM"),
        ("default", "MEDIUM"),
        ("p3", "LOW"),
        ("minor", "LOW"),
        ("trivial", "LOW"),
        ("lowest", "LOW"),
    ]
    .into_iter()
    .collect()
});

/// Type synonyms for intent detection.
static TYPE_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("defect", "BUG"),
        ("issue", "BUG"),
        ("problem", "BUG"),
        ("enhancement", "FEATURE"),
        ("improvement", "FEATURE"),
        ("chore", "TASK"),
        ("ticket", "TASK"),
        ("user-story", "STORY"),
        ("initiative", "EPIC"),
    ]
    .into_iter()
    .collect()
});

// === Intent Detection ===

/// Detect which canonical value the caller likely meant.
fn detect_intent(
    input: &str,
    valid: &[&'static str],
    synonyms: &HashMap<&'static str, &'static str>,
) -> Option<&'static str> {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some(&canonical) = synonyms.get(lower.as_str()) {
        return Some(canonical);
    }

    // Prefix match against the canonical spelling
    let upper = lower.to_uppercase();
    valid.iter().copied().find(|value| value.starts_with(&upper))
}
