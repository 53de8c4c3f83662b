//! Request payloads for the HTTP API.
//!
//! Enum and date fields arrive as strings and are parsed here, so an unknown
//! value produces a precise 400 (`INVALID_STATUS`, `INVALID_PRIORITY`, ...)
//! instead of a generic body rejection.

use crate::error::{Result, TrackerError};
use crate::model::{IssueUpdate, NewIssue, Status, deserialize_some};
use crate::storage::ListFilters;
use crate::util::time::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

/// Body of `POST /api/issues/{projectId}` and `POST /api/projects/{id}/issues`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub epic: Option<String>,
    pub story_points: Option<u32>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
}

impl CreateIssueRequest {
    /// Validate and convert into a store input.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing title, or an invalid-value
    /// error for an unknown status, priority, type or date.
    pub fn into_new_issue(self) -> Result<NewIssue> {
        let title = self.title.unwrap_or_default();
        if title.trim().is_empty() {
            return Err(TrackerError::validation("title", "Title is required"));
        }

        Ok(NewIssue {
            title,
            description: self.description,
            status: parse_enum(self.status.as_deref())?,
            priority: parse_enum(self.priority.as_deref())?,
            issue_type: parse_enum(self.issue_type.as_deref())?,
            assignee: non_empty(self.assignee),
            reporter: non_empty(self.reporter),
            epic: non_empty(self.epic),
            story_points: self.story_points,
            start_date: parse_date(self.start_date.as_deref(), "startDate")?,
            due_date: parse_date(self.due_date.as_deref(), "dueDate")?,
        })
    }
}

/// Body of `PUT /api/issues/{id}`.
///
/// A missing key leaves the field unchanged; an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub priority: Option<Option<String>>,
    #[serde(default, rename = "type", deserialize_with = "deserialize_some")]
    pub issue_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assignee: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub reporter: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub epic: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub story_points: Option<Option<u32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<String>>,
}

impl UpdateIssueRequest {
    /// Validate and convert into a partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank or null title or a null status,
    /// or an invalid-value error for an unknown enum value or date.
    pub fn into_update(self) -> Result<IssueUpdate> {
        let title = match self.title {
            None => None,
            Some(Some(title)) if !title.trim().is_empty() => Some(title),
            Some(_) => return Err(TrackerError::validation("title", "Title is required")),
        };

        let status = match self.status {
            None => None,
            Some(Some(raw)) => Some(raw.parse::<Status>()?),
            Some(None) => return Err(TrackerError::validation("status", "cannot be null")),
        };

        Ok(IssueUpdate {
            title,
            description: self.description,
            status,
            priority: self
                .priority
                .map(|raw| parse_enum(raw.as_deref()))
                .transpose()?,
            issue_type: self
                .issue_type
                .map(|raw| parse_enum(raw.as_deref()))
                .transpose()?,
            assignee: self.assignee.map(non_empty),
            reporter: self.reporter.map(non_empty),
            epic: self.epic.map(non_empty),
            story_points: self.story_points,
            start_date: self
                .start_date
                .map(|raw| parse_date(raw.as_deref(), "startDate"))
                .transpose()?,
            due_date: self
                .due_date
                .map(|raw| parse_date(raw.as_deref(), "dueDate"))
                .transpose()?,
        })
    }
}

/// Query string of `GET /api/issues`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueQuery {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub epic: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl IssueQuery {
    /// Convert into store filters.
    ///
    /// # Errors
    ///
    /// Returns an invalid-value error for an unknown status, priority or type.
    pub fn into_filters(self) -> Result<ListFilters> {
        Ok(ListFilters {
            project_id: self.project_id.filter(|id| !id.is_empty()),
            status: parse_enum(self.status.as_deref())?,
            priority: parse_enum(self.priority.as_deref())?,
            issue_type: parse_enum(self.issue_type.as_deref())?,
            assignee: self.assignee,
            epic: self.epic,
            search: self.search,
            limit: self.limit,
        })
    }
}

/// An empty label counts as unset. Other values are kept verbatim.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.is_empty())
}

/// Parse an optional enum; an empty string counts as unset.
fn parse_enum<T>(raw: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = TrackerError>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

fn parse_date(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value, field).map(Some),
    }
}
