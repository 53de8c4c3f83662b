//! Project statistics aggregation.
//!
//! [`compute_statistics`] is a pure function of `(issues, now)`: it reads no
//! clock and no storage, so the same input always yields identical output,
//! down to map iteration order.
//!
//! Recency windows are open at the lower bound and closed at the upper:
//! an issue counts as recently updated when `now - 7d < updatedAt <= now`.
//! `dueSoon` is strictly inside `(now, now + 7d)`.

use crate::error::{Result, TrackerError};
use crate::model::{Issue, IssueType, Priority, ProjectWithIssues, Status};
use crate::storage::SqliteStorage;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length of the recency and due-soon windows, in days.
pub const WINDOW_DAYS: i64 = 7;

/// Counts over the trailing and leading seven-day windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecencyStats {
    /// `DONE` issues updated within the window.
    pub completed: usize,
    /// Issues updated within the window.
    pub updated: usize,
    /// Issues created within the window.
    pub created: usize,
    /// Issues due within the coming week.
    pub due_soon: usize,
}

/// Issue count per board column. Every column is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDistribution {
    pub todo: usize,
    pub progress: usize,
    pub review: usize,
    pub done: usize,
}

impl StatusDistribution {
    fn record(&mut self, status: Status) {
        match status {
            Status::ToDo => self.todo += 1,
            Status::InProgress => self.progress += 1,
            Status::InReview => self.review += 1,
            Status::Done => self.done += 1,
        }
    }

    /// Count for a single status.
    #[must_use]
    pub const fn get(&self, status: Status) -> usize {
        match status {
            Status::ToDo => self.todo,
            Status::InProgress => self.progress,
            Status::InReview => self.review,
            Status::Done => self.done,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.todo + self.progress + self.review + self.done
    }
}

/// Issue count per priority. Issues without a priority are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl PriorityDistribution {
    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
            Priority::Critical => self.critical += 1,
        }
    }

    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Critical => self.critical,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical
    }
}

/// Issue count per type. Issues without a type are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDistribution {
    pub task: usize,
    pub bug: usize,
    pub feature: usize,
    pub story: usize,
    pub epic: usize,
}

impl TypeDistribution {
    fn record(&mut self, issue_type: IssueType) {
        match issue_type {
            IssueType::Task => self.task += 1,
            IssueType::Bug => self.bug += 1,
            IssueType::Feature => self.feature += 1,
            IssueType::Story => self.story += 1,
            IssueType::Epic => self.epic += 1,
        }
    }

    #[must_use]
    pub const fn get(&self, issue_type: IssueType) -> usize {
        match issue_type {
            IssueType::Task => self.task,
            IssueType::Bug => self.bug,
            IssueType::Feature => self.feature,
            IssueType::Story => self.story,
            IssueType::Epic => self.epic,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.task + self.bug + self.feature + self.story + self.epic
    }
}

/// Completion of one epic label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicProgress {
    pub total: usize,
    /// Always `<= total`.
    pub completed: usize,
}

/// Aggregated statistics for one project's issues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatistics {
    pub stats: RecencyStats,
    pub status_distribution: StatusDistribution,
    pub priority_distribution: PriorityDistribution,
    pub type_distribution: TypeDistribution,
    /// Assignee name to issue count. Unassigned issues are excluded.
    pub team_workload: BTreeMap<String, usize>,
    /// Epic label to progress. Issues without an epic are excluded.
    pub epic_progress: BTreeMap<String, EpicProgress>,
}

/// Compute statistics over `issues` as of `now` in a single pass.
#[must_use]
pub fn compute_statistics(issues: &[Issue], now: DateTime<Utc>) -> ProjectStatistics {
    let window = Duration::days(WINDOW_DAYS);
    let recent_start = now - window;
    let due_horizon = now + window;
    let is_recent = |t: DateTime<Utc>| recent_start < t && t <= now;

    let mut out = ProjectStatistics::default();

    for issue in issues {
        let done = issue.status.is_done();

        if is_recent(issue.updated_at) {
            out.stats.updated += 1;
            if done {
                out.stats.completed += 1;
            }
        }
        if is_recent(issue.created_at) {
            out.stats.created += 1;
        }
        if issue
            .due_date
            .is_some_and(|due| now < due && due < due_horizon)
        {
            out.stats.due_soon += 1;
        }

        out.status_distribution.record(issue.status);
        if let Some(priority) = issue.priority {
            out.priority_distribution.record(priority);
        }
        if let Some(issue_type) = issue.issue_type {
            out.type_distribution.record(issue_type);
        }

        if let Some(assignee) = issue.assignee.as_ref().filter(|name| !name.is_empty()) {
            *out.team_workload.entry(assignee.clone()).or_default() += 1;
        }

        if let Some(epic) = issue.epic.as_ref().filter(|label| !label.is_empty()) {
            let progress = out.epic_progress.entry(epic.clone()).or_default();
            progress.total += 1;
            if done {
                progress.completed += 1;
            }
        }
    }

    out
}

/// Statistics report for one project: the project (with issues) plus its statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project: ProjectWithIssues,
    #[serde(flatten)]
    pub statistics: ProjectStatistics,
}

impl ProjectReport {
    /// Aggregate an already-loaded project.
    #[must_use]
    pub fn build(project: ProjectWithIssues, now: DateTime<Utc>) -> Self {
        let statistics = compute_statistics(&project.issues, now);
        Self {
            project,
            statistics,
        }
    }
}

/// Load a project with its issues and aggregate them.
///
/// # Errors
///
/// Returns `ProjectNotFound` if no project has `project_id`, or a database error.
pub fn project_statistics(
    storage: &SqliteStorage,
    project_id: &str,
    now: DateTime<Utc>,
) -> Result<ProjectReport> {
    let project = storage
        .get_project_with_issues(project_id)?
        .ok_or_else(|| TrackerError::ProjectNotFound {
            id: project_id.to_string(),
        })?;

    tracing::debug!(
        project_id,
        issues = project.issues.len(),
        "Computing project statistics"
    );
    Ok(ProjectReport::build(project, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn issue(status: Status, updated_at: DateTime<Utc>) -> Issue {
        let created_at = updated_at - Duration::days(30);
        Issue {
            id: format!("i-{}", updated_at.timestamp()),
            project_id: "p-1".to_string(),
            title: "t".to_string(),
            description: None,
            status,
            priority: None,
            issue_type: None,
            assignee: None,
            reporter: None,
            epic: None,
            story_points: None,
            created_at,
            updated_at,
            start_date: None,
            due_date: None,
        }
    }

    #[test]
    fn empty_input_is_zero_filled() {
        let stats = compute_statistics(&[], now());
        assert_eq!(stats, ProjectStatistics::default());
        assert_eq!(stats.status_distribution.total(), 0);
        assert!(stats.team_workload.is_empty());
        assert!(stats.epic_progress.is_empty());
    }

    #[test]
    fn mixed_recency_scenario() {
        let now = now();
        let mut due = issue(Status::InProgress, now);
        due.due_date = Some(now + Duration::days(3));
        let issues = vec![
            issue(Status::Done, now - Duration::days(1)),
            issue(Status::ToDo, now - Duration::days(10)),
            due,
        ];

        let stats = compute_statistics(&issues, now);
        assert_eq!(stats.stats.completed, 1);
        assert_eq!(stats.stats.updated, 2);
        assert_eq!(stats.stats.due_soon, 1);
        assert_eq!(
            stats.status_distribution,
            StatusDistribution {
                todo: 1,
                progress: 1,
                review: 0,
                done: 1
            }
        );
    }

    #[test]
    fn empty_labels_are_skipped() {
        let now = now();
        let mut blank = issue(Status::Done, now);
        blank.assignee = Some(String::new());
        blank.epic = Some(String::new());

        let stats = compute_statistics(&[blank], now);
        assert!(stats.team_workload.is_empty());
        assert!(stats.epic_progress.is_empty());
        assert_eq!(stats.status_distribution.done, 1);
    }

    #[test]
    fn window_is_open_below_and_closed_above() {
        let now = now();
        let on_lower = issue(Status::Done, now - Duration::days(WINDOW_DAYS));
        let at_now = issue(Status::Done, now);
        let future = issue(Status::Done, now + Duration::seconds(1));

        let stats = compute_statistics(&[on_lower, at_now, future], now);
        assert_eq!(stats.stats.updated, 1);
        assert_eq!(stats.stats.completed, 1);
    }

    #[test]
    fn due_soon_excludes_both_bounds() {
        let now = now();
        let mut at_now = issue(Status::ToDo, now - Duration::days(30));
        at_now.due_date = Some(now);
        let mut at_horizon = at_now.clone();
        at_horizon.due_date = Some(now + Duration::days(WINDOW_DAYS));
        let mut inside = at_now.clone();
        inside.due_date = Some(now + Duration::days(WINDOW_DAYS) - Duration::seconds(1));

        let stats = compute_statistics(&[at_now, at_horizon, inside], now);
        assert_eq!(stats.stats.due_soon, 1);
    }

    #[test]
    fn workload_excludes_unassigned_and_keeps_literal_names() {
        let now = now();
        let mut a = issue(Status::ToDo, now);
        a.assignee = Some("Ann".to_string());
        let b = a.clone();
        let mut lower = a.clone();
        lower.assignee = Some("ann".to_string());
        let unassigned = issue(Status::ToDo, now);

        let stats = compute_statistics(&[a, b, lower, unassigned], now);
        let expected: BTreeMap<String, usize> =
            [("Ann".to_string(), 2), ("ann".to_string(), 1)].into_iter().collect();
        assert_eq!(stats.team_workload, expected);
    }

    #[test]
    fn epic_progress_counts_done() {
        let now = now();
        let mut done = issue(Status::Done, now);
        done.epic = Some("Mobile".to_string());
        let mut open = issue(Status::InReview, now);
        open.epic = Some("Mobile".to_string());

        let stats = compute_statistics(&[done.clone(), done, open], now);
        assert_eq!(
            stats.epic_progress["Mobile"],
            EpicProgress {
                total: 3,
                completed: 2
            }
        );
    }

    #[test]
    fn priority_and_type_skip_unset() {
        let now = now();
        let mut high = issue(Status::ToDo, now);
        high.priority = Some(Priority::High);
        high.issue_type = Some(IssueType::Bug);
        let unset = issue(Status::ToDo, now);

        let stats = compute_statistics(&[high, unset], now);
        assert_eq!(stats.priority_distribution.total(), 1);
        assert_eq!(stats.priority_distribution.get(Priority::High), 1);
        assert_eq!(stats.type_distribution.get(IssueType::Bug), 1);
        assert_eq!(stats.type_distribution.total(), 1);
        assert_eq!(stats.status_distribution.get(Status::ToDo), 2);
    }

    #[test]
    fn serializes_with_wire_keys() {
        let now = now();
        let mut i = issue(Status::InReview, now);
        i.due_date = Some(now + Duration::days(1));
        let json = serde_json::to_value(compute_statistics(&[i], now)).unwrap();

        assert_eq!(json["stats"]["dueSoon"], 1);
        assert_eq!(json["statusDistribution"]["review"], 1);
        assert_eq!(json["priorityDistribution"]["critical"], 0);
        assert_eq!(json["typeDistribution"]["epic"], 0);
        assert!(json["teamWorkload"].as_object().unwrap().is_empty());
        assert!(json["epicProgress"].as_object().unwrap().is_empty());
    }

    #[test]
    fn project_statistics_unknown_project() {
        let storage = SqliteStorage::open_memory().unwrap();
        let err = project_statistics(&storage, "missing", now()).unwrap_err();
        assert!(matches!(err, TrackerError::ProjectNotFound { id } if id == "missing"));
    }
}
