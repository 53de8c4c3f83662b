//! Core data types for `bugboard`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Project` - The aggregate root that owns issues
//! - `Issue` - The core work item
//! - `Status` - Issue lifecycle states (board columns)
//! - `Priority` - Issue urgency
//! - `IssueType` - Categories of issues
//! - `NewProject`, `ProjectUpdate`, `NewIssue`, `IssueUpdate` - Write inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deserialize a field that distinguishes "absent" from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>`: a missing key stays `None`, `null` becomes `Some(None)`.
///
/// # Errors
///
/// Returns the inner deserializer's error.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn normalize_enum_input(s: &str) -> String {
    s.trim().to_uppercase().replace(['-', ' '], "_")
}

/// Issue lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    ToDo,
    InProgress,
    InReview,
    Done,
}

impl Status {
    pub const ALL: [Self; 4] = [Self::ToDo, Self::InProgress, Self::InReview, Self::Done];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "TO_DO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Done => "DONE",
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_input(s).as_str() {
            "TO_DO" | "TODO" => Ok(Self::ToDo),
            "IN_PROGRESS" | "INPROGRESS" => Ok(Self::InProgress),
            "IN_REVIEW" | "INREVIEW" => Ok(Self::InReview),
            "DONE" => Ok(Self::Done),
            _ => Err(crate::error::TrackerError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Issue priority, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_input(s).as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(crate::error::TrackerError::InvalidPriority {
                priority: s.to_string(),
            }),
        }
    }
}

/// Issue type category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Task,
    Bug,
    Feature,
    Story,
    Epic,
}

impl IssueType {
    pub const ALL: [Self; 5] = [
        Self::Task,
        Self::Bug,
        Self::Feature,
        Self::Story,
        Self::Epic,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Bug => "BUG",
            Self::Feature => "FEATURE",
            Self::Story => "STORY",
            Self::Epic => "EPIC",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_input(s).as_str() {
            "TASK" => Ok(Self::Task),
            "BUG" => Ok(Self::Bug),
            "FEATURE" => Ok(Self::Feature),
            "STORY" => Ok(Self::Story),
            "EPIC" => Ok(Self::Epic),
            _ => Err(crate::error::TrackerError::InvalidType {
                issue_type: s.to_string(),
            }),
        }
    }
}

/// A project: the aggregate root that owns issues.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Opaque unique ID (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Short key (e.g., "ECOM").
    #[serde(default)]
    pub key: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A project together with every issue it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectWithIssues {
    #[serde(flatten)]
    pub project: Project,

    /// Owned issues, newest first.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// The primary issue entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Opaque unique ID (UUID v4).
    pub id: String,

    /// Owning project.
    pub project_id: String,

    /// Title (1-500 chars).
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Board column.
    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default, rename = "type")]
    pub issue_type: Option<IssueType>,

    /// Free-text assignee name, compared literally.
    #[serde(default)]
    pub assignee: Option<String>,

    /// Free-text reporter name.
    #[serde(default)]
    pub reporter: Option<String>,

    /// Free-text epic label, compared literally.
    #[serde(default)]
    pub epic: Option<String>,

    /// Estimate in story points.
    #[serde(default)]
    pub story_points: Option<u32>,

    pub created_at: DateTime<Utc>,

    /// Last update timestamp (never before `created_at`).
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// An issue with its owning project embedded, as returned by issue reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueWithProject {
    #[serde(flatten)]
    pub issue: Issue,

    pub project: Project,
}

/// Fields for creating a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Fields to update on a project. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub key: Option<Option<String>>,
}

impl ProjectUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.key.is_none()
    }
}

/// Fields for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `TO_DO` when unset.
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub epic: Option<String>,
    pub story_points: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewIssue {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Fields to update on an issue.
///
/// Outer `None` leaves a field unchanged; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Option<Priority>>,
    pub issue_type: Option<Option<IssueType>>,
    pub assignee: Option<Option<String>>,
    pub reporter: Option<Option<String>>,
    pub epic: Option<Option<String>>,
    pub story_points: Option<Option<u32>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl IssueUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.issue_type.is_none()
            && self.assignee.is_none()
            && self.reporter.is_none()
            && self.epic.is_none()
            && self.story_points.is_none()
            && self.start_date.is_none()
            && self.due_date.is_none()
    }

    /// Apply this update to an issue in memory (timestamps untouched).
    pub fn apply_to(&self, issue: &mut Issue) {
        if let Some(ref title) = self.title {
            issue.title.clone_from(title);
        }
        if let Some(ref val) = self.description {
            issue.description.clone_from(val);
        }
        if let Some(status) = self.status {
            issue.status = status;
        }
        if let Some(priority) = self.priority {
            issue.priority = priority;
        }
        if let Some(issue_type) = self.issue_type {
            issue.issue_type = issue_type;
        }
        if let Some(ref val) = self.assignee {
            issue.assignee.clone_from(val);
        }
        if let Some(ref val) = self.reporter {
            issue.reporter.clone_from(val);
        }
        if let Some(ref val) = self.epic {
            issue.epic.clone_from(val);
        }
        if let Some(points) = self.story_points {
            issue.story_points = points;
        }
        if let Some(start) = self.start_date {
            issue.start_date = start;
        }
        if let Some(due) = self.due_date {
            issue.due_date = due;
        }
    }
}
