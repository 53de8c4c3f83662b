#![allow(dead_code)]

use bugboard::model::{Issue, IssueType, Priority, Status};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed reference instant for statistics scenarios.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// A `TO_DO` issue created and updated 30 days before [`now`].
pub fn issue(project_id: &str, title: &str) -> Issue {
    let created = now() - Duration::days(30);
    Issue {
        id: format!("issue-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed)),
        project_id: project_id.to_string(),
        title: title.to_string(),
        description: None,
        status: Status::ToDo,
        priority: None,
        issue_type: None,
        assignee: None,
        reporter: None,
        epic: None,
        story_points: None,
        created_at: created,
        updated_at: created,
        start_date: None,
        due_date: None,
    }
}

pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            issue: issue("project", title),
        }
    }

    pub fn in_project(mut self, project_id: &str) -> Self {
        self.issue.project_id = project_id.to_string();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.issue.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.issue.priority = Some(priority);
        self
    }

    pub fn with_type(mut self, issue_type: IssueType) -> Self {
        self.issue.issue_type = Some(issue_type);
        self
    }

    pub fn with_assignee(mut self, assignee: &str) -> Self {
        self.issue.assignee = Some(assignee.to_string());
        self
    }

    pub fn with_epic(mut self, epic: &str) -> Self {
        self.issue.epic = Some(epic.to_string());
        self
    }

    /// Set `updatedAt` to `now() - ago`, pulling `createdAt` back if needed.
    pub fn updated_ago(mut self, ago: Duration) -> Self {
        self.issue.updated_at = now() - ago;
        if self.issue.created_at > self.issue.updated_at {
            self.issue.created_at = self.issue.updated_at;
        }
        self
    }

    pub fn created_ago(mut self, ago: Duration) -> Self {
        self.issue.created_at = now() - ago;
        if self.issue.updated_at < self.issue.created_at {
            self.issue.updated_at = self.issue.created_at;
        }
        self
    }

    pub fn due_in(mut self, ahead: Duration) -> Self {
        self.issue.due_date = Some(now() + ahead);
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}
