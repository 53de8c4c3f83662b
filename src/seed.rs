//! Sample dataset for demos and manual testing.
//!
//! Three projects with issues spread across every status, priority, type,
//! assignee and epic. Dates are derived from the issue's position, so the
//! same `now` always produces the same data.

use crate::error::{Result, TrackerError};
use crate::model::{Issue, IssueType, Priority, Project, Status};
use crate::storage::SqliteStorage;
use crate::util::generate_id;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model::{IssueType as T, Priority as P, Status as S};

const ASSIGNEES: [&str; 6] = [
    "John Doe",
    "Jane Smith",
    "Mike Johnson",
    "Sarah Wilson",
    "Alex Brown",
    "Emily Davis",
];

const UX: &str = "User Experience";
const PERF: &str = "Performance";
const SEC: &str = "Security";
const ANALYTICS: &str = "Analytics";
const MOBILE: &str = "Mobile Support";

/// (title, type, priority, status, epic, story points)
type IssueTemplate = (&'static str, IssueType, Priority, Status, &'static str, u32);

struct ProjectTemplate {
    name: &'static str,
    key: &'static str,
    description: &'static str,
    issues: &'static [IssueTemplate],
}

const PROJECTS: [ProjectTemplate; 3] = [
    ProjectTemplate {
        name: "E-commerce Platform",
        key: "ECOM",
        description: "Online storefront with catalog, cart and checkout",
        issues: &[
            ("Design product database schema", T::Task, P::High, S::Done, PERF, 8),
            ("Product catalog with filtering", T::Feature, P::High, S::InProgress, UX, 13),
            ("Persist shopping cart across sessions", T::Feature, P::Medium, S::InReview, UX, 5),
            ("Integrate payment provider", T::Task, P::Critical, S::ToDo, SEC, 8),
            ("Order tracking and notifications", T::Feature, P::Medium, S::ToDo, UX, 13),
            ("Admin dashboard for orders", T::Feature, P::Medium, S::ToDo, ANALYTICS, 21),
            ("Login and password reset", T::Feature, P::High, S::Done, SEC, 8),
            ("Checkout total ignores discount code", T::Bug, P::Critical, S::InProgress, SEC, 3),
            ("Slow search on large catalogs", T::Bug, P::High, S::InReview, PERF, 5),
            ("Sales reporting", T::Epic, P::Low, S::ToDo, ANALYTICS, 34),
            ("As a shopper I can save a wishlist", T::Story, P::Low, S::Done, UX, 3),
            ("Responsive checkout on phones", T::Story, P::Medium, S::InProgress, MOBILE, 5),
        ],
    },
    ProjectTemplate {
        name: "Website Redesign",
        key: "WEB",
        description: "Refresh of the company website around the new brand",
        issues: &[
            ("New landing page layout", T::Feature, P::High, S::Done, UX, 8),
            ("Audit page load times", T::Task, P::Medium, S::Done, PERF, 3),
            ("Navigation menu overlaps logo", T::Bug, P::Medium, S::InProgress, UX, 2),
            ("Add analytics events to signup", T::Task, P::Low, S::ToDo, ANALYTICS, 3),
            ("Content security policy headers", T::Task, P::High, S::InReview, SEC, 2),
            ("Brand refresh", T::Epic, P::Medium, S::InProgress, UX, 21),
            ("As a visitor I can read the blog on mobile", T::Story, P::Medium, S::ToDo, MOBILE, 5),
            ("Contact form drops attachments", T::Bug, P::High, S::ToDo, UX, 3),
            ("Compress hero images", T::Task, P::Low, S::Done, PERF, 1),
        ],
    },
    ProjectTemplate {
        name: "Mobile App Development",
        key: "MOB",
        description: "Cross-platform mobile client for iOS and Android",
        issues: &[
            ("Set up build pipeline for both platforms", T::Task, P::High, S::Done, MOBILE, 5),
            ("Push notification support", T::Feature, P::Medium, S::InProgress, MOBILE, 8),
            ("Biometric login", T::Feature, P::High, S::ToDo, SEC, 8),
            ("App crashes when rotating on tablets", T::Bug, P::Critical, S::InReview, MOBILE, 3),
            ("Offline mode", T::Epic, P::Medium, S::ToDo, PERF, 40),
            ("Screen view tracking", T::Task, P::Low, S::Done, ANALYTICS, 2),
            ("As a user I can switch to dark mode", T::Story, P::Low, S::InProgress, UX, 5),
            ("Cold start exceeds three seconds", T::Bug, P::High, S::ToDo, PERF, 5),
            ("Store listing screenshots", T::Task, P::Low, S::Done, MOBILE, 1),
            ("Token refresh loops after logout", T::Bug, P::High, S::Done, SEC, 3),
        ],
    },
];

/// Counts of what a seed run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub projects: usize,
    pub issues: usize,
}

/// Load the sample dataset.
///
/// Refuses when the database already holds projects unless `force` is set,
/// in which case existing data is replaced. The load runs in one
/// transaction, so a failure leaves the previous data untouched.
///
/// # Errors
///
/// Returns a validation error when data exists and `force` is false, or a
/// database error.
pub fn seed(storage: &mut SqliteStorage, now: DateTime<Utc>, force: bool) -> Result<SeedSummary> {
    let existing = storage.count_projects()?;
    if existing > 0 && !force {
        return Err(TrackerError::validation(
            "seed",
            format!(
                "database already contains {existing} project(s); use --force to replace them"
            ),
        ));
    }

    let (projects, issues) = sample_dataset(now);
    let cleared = storage.load_dataset(&projects, &issues, force)?;

    let summary = SeedSummary {
        projects: projects.len(),
        issues: issues.len(),
    };
    tracing::info!(
        cleared,
        projects = summary.projects,
        issues = summary.issues,
        "Seeded sample data"
    );
    Ok(summary)
}

/// Build every sample project and issue without touching the database.
fn sample_dataset(now: DateTime<Utc>) -> (Vec<Project>, Vec<Issue>) {
    let mut projects = Vec::with_capacity(PROJECTS.len());
    let mut issues = Vec::new();

    for (offset, template) in (0_i64..).zip(PROJECTS.iter()) {
        let project = Project {
            id: generate_id(),
            name: template.name.to_string(),
            description: Some(template.description.to_string()),
            key: Some(template.key.to_string()),
            created_at: now - Duration::days(45 - offset),
        };

        for &(title, issue_type, priority, status, epic, points) in template.issues {
            let issue = sample_issue(&project.id, issues.len(), now, title, status);
            issues.push(Issue {
                issue_type: Some(issue_type),
                priority: Some(priority),
                epic: Some(epic.to_string()),
                story_points: Some(points),
                ..issue
            });
        }
        projects.push(project);
    }

    (projects, issues)
}

/// Deterministic people and dates for the issue at `position`.
///
/// Created within the last month, updated between creation and now, due
/// within the next month. Only started issues carry a start date.
fn sample_issue(
    project_id: &str,
    position: usize,
    now: DateTime<Utc>,
    title: &str,
    status: Status,
) -> Issue {
    let step = i64::try_from(position).unwrap_or(0);
    let created_at = now - Duration::days(step * 7 % 29 + 1) - Duration::hours(step % 11);
    let updated_at = (created_at + Duration::days(step * 5 % 12)).min(now);
    let start_date = (status != Status::ToDo).then(|| (created_at + Duration::days(1)).min(now));
    let due_date = now + Duration::days(step * 3 % 29 + 1);

    let assignee = (position % 7 != 6).then(|| ASSIGNEES[position % ASSIGNEES.len()].to_string());
    let reporter = ASSIGNEES[(position + 3) % ASSIGNEES.len()].to_string();

    Issue {
        id: generate_id(),
        project_id: project_id.to_string(),
        title: title.to_string(),
        description: None,
        status,
        priority: None,
        issue_type: None,
        assignee,
        reporter: Some(reporter),
        epic: None,
        story_points: None,
        created_at,
        updated_at,
        start_date,
        due_date: Some(due_date),
    }
}
