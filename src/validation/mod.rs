//! Validation helpers for `bugboard`.
//!
//! These routines enforce project and issue data constraints and return
//! structured validation errors without touching storage.

use crate::error::ValidationError;
use crate::model::{Issue, NewProject, Project};

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 500;
/// Maximum project name length in characters.
pub const MAX_NAME_LEN: usize = 200;
/// Maximum project key length in characters.
pub const MAX_KEY_LEN: usize = 20;
/// Maximum description length in bytes (100KB).
pub const MAX_DESCRIPTION_LEN: usize = 102_400;
/// Maximum length for free-text people and epic labels.
pub const MAX_LABEL_LEN: usize = 200;

/// Validates issue fields and invariants.
pub struct IssueValidator;

impl IssueValidator {
    /// Validate an issue and return all validation errors found.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate(issue: &Issue) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        // Title: Required, max 500 chars.
        if issue.title.trim().is_empty() {
            errors.push(ValidationError::new("title", "Title is required"));
        }
        if issue.title.chars().count() > MAX_TITLE_LEN {
            errors.push(ValidationError::new("title", "exceeds 500 characters"));
        }

        if let Some(description) = issue.description.as_ref() {
            if description.len() > MAX_DESCRIPTION_LEN {
                errors.push(ValidationError::new("description", "exceeds 100KB"));
            }
        }

        for (field, value) in [
            ("assignee", &issue.assignee),
            ("reporter", &issue.reporter),
            ("epic", &issue.epic),
        ] {
            if value
                .as_ref()
                .is_some_and(|v| v.chars().count() > MAX_LABEL_LEN)
            {
                errors.push(ValidationError::new(field, "exceeds 200 characters"));
            }
        }

        // Timestamps: created_at <= updated_at.
        if issue.updated_at < issue.created_at {
            errors.push(ValidationError::new(
                "updatedAt",
                "cannot be before createdAt",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Validates project fields.
pub struct ProjectValidator;

impl ProjectValidator {
    /// Validate a project creation request.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate_new(project: &NewProject) -> Result<(), Vec<ValidationError>> {
        Self::check(&project.name, project.description.as_deref(), project.key.as_deref())
    }

    /// Validate a stored or merged project.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate(project: &Project) -> Result<(), Vec<ValidationError>> {
        Self::check(&project.name, project.description.as_deref(), project.key.as_deref())
    }

    fn check(
        name: &str,
        description: Option<&str>,
        key: Option<&str>,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            errors.push(ValidationError::new("name", "exceeds 200 characters"));
        }

        if description.is_some_and(|d| d.len() > MAX_DESCRIPTION_LEN) {
            errors.push(ValidationError::new("description", "exceeds 100KB"));
        }

        if let Some(key) = key {
            if key.chars().count() > MAX_KEY_LEN {
                errors.push(ValidationError::new("key", "exceeds 20 characters"));
            }
            if key.chars().any(char::is_whitespace) {
                errors.push(ValidationError::new("key", "cannot contain whitespace"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
