//! `SQLite` storage implementation.

use crate::error::{Result, TrackerError};
use crate::model::{
    Issue, IssueType, IssueUpdate, IssueWithProject, NewIssue, NewProject, Priority, Project,
    ProjectUpdate, ProjectWithIssues, Status,
};
use crate::storage::schema::apply_schema;
use crate::util::generate_id;
use crate::util::time::{format_timestamp, parse_stored_timestamp};
use crate::validation::{IssueValidator, ProjectValidator};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const ISSUE_COLUMNS: &str = "i.id, i.project_id, i.title, i.description, i.status, i.priority,
    i.issue_type, i.assignee, i.reporter, i.epic, i.story_points,
    i.created_at, i.updated_at, i.start_date, i.due_date";

const PROJECT_COLUMNS: &str = "p.id, p.name, p.description, p.key, p.created_at";

/// Column offset of the joined project in an issue+project row.
const JOINED_PROJECT_OFFSET: usize = 15;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Filter options for listing issues.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub project_id: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub issue_type: Option<IssueType>,
    /// Exact match.
    pub assignee: Option<String>,
    /// Exact match.
    pub epic: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        tracing::debug!(path = %path.display(), "Opened database");
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Run a write inside an immediate transaction.
    ///
    /// The transaction is rolled back if `f` returns an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` fails or the commit fails.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let result = f(&tx)?;

        tx.commit()?;
        tracing::trace!(op, "Committed mutation");

        Ok(result)
    }

    // ========================================================================
    // PROJECTS
    // ========================================================================

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a database error.
    pub fn create_project(&mut self, input: &NewProject) -> Result<Project> {
        self.create_project_at(input, Utc::now())
    }

    /// Create a project with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a database error.
    pub fn create_project_at(&mut self, input: &NewProject, now: DateTime<Utc>) -> Result<Project> {
        ProjectValidator::validate_new(input).map_err(TrackerError::from_validation_errors)?;

        let project = Project {
            id: generate_id(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            key: input.key.clone(),
            created_at: now,
        };

        self.mutate("create_project", |tx| insert_project_row(tx, &project))?;

        tracing::info!(id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    /// List every project with its issues, newest project first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_projects(&self) -> Result<Vec<ProjectWithIssues>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p ORDER BY p.created_at DESC, p.rowid DESC"
        ))?;
        let projects = stmt
            .query_map([], |row| project_from_row(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues i ORDER BY i.created_at DESC, i.rowid DESC"
        ))?;
        let mut by_project: HashMap<String, Vec<Issue>> = HashMap::new();
        for issue in stmt.query_map([], issue_from_row)? {
            let issue = issue?;
            by_project
                .entry(issue.project_id.clone())
                .or_default()
                .push(issue);
        }

        Ok(projects
            .into_iter()
            .map(|project| {
                let issues = by_project.remove(&project.id).unwrap_or_default();
                ProjectWithIssues { project, issues }
            })
            .collect())
    }

    /// Get a project by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?");
        let project = self
            .conn
            .query_row(&sql, [id], |row| project_from_row(row, 0))
            .optional()?;
        Ok(project)
    }

    /// Get a project together with its issues (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_project_with_issues(&self, id: &str) -> Result<Option<ProjectWithIssues>> {
        let Some(project) = self.get_project(id)? else {
            return Ok(None);
        };
        let issues = self.issues_for_project(id)?;
        Ok(Some(ProjectWithIssues { project, issues }))
    }

    /// Apply a partial update to a project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` for an unknown ID, or a validation error if the
    /// merged project is invalid.
    pub fn update_project(
        &mut self,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<ProjectWithIssues> {
        let mut project = self
            .get_project(id)?
            .ok_or_else(|| TrackerError::ProjectNotFound { id: id.to_string() })?;

        if !update.is_empty() {
            if let Some(ref name) = update.name {
                project.name = name.trim().to_string();
            }
            if let Some(ref description) = update.description {
                project.description.clone_from(description);
            }
            if let Some(ref key) = update.key {
                project.key.clone_from(key);
            }

            ProjectValidator::validate(&project).map_err(TrackerError::from_validation_errors)?;

            self.mutate("update_project", |tx| {
                tx.execute(
                    "UPDATE projects SET name = ?, description = ?, key = ? WHERE id = ?",
                    rusqlite::params![project.name, project.description, project.key, id],
                )?;
                Ok(())
            })?;
            tracing::info!(id, "Updated project");
        }

        let issues = self.issues_for_project(id)?;
        Ok(ProjectWithIssues { project, issues })
    }

    /// Delete a project and, by cascade, all of its issues.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` for an unknown ID, or a database error.
    pub fn delete_project(&mut self, id: &str) -> Result<()> {
        let deleted = self.mutate("delete_project", |tx| {
            Ok(tx.execute("DELETE FROM projects WHERE id = ?", [id])?)
        })?;

        if deleted == 0 {
            return Err(TrackerError::ProjectNotFound { id: id.to_string() });
        }
        tracing::info!(id, "Deleted project");
        Ok(())
    }

    /// Insert fully-formed projects and issues in a single transaction.
    ///
    /// With `replace`, every existing project (and its issues) is deleted
    /// first. Either the whole batch lands or nothing changes. Returns the
    /// number of projects removed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid record, `ProjectNotFound`
    /// when an issue's project is neither in the batch nor stored, or a
    /// database error.
    pub fn load_dataset(
        &mut self,
        projects: &[Project],
        issues: &[Issue],
        replace: bool,
    ) -> Result<usize> {
        for project in projects {
            ProjectValidator::validate(project).map_err(TrackerError::from_validation_errors)?;
        }
        for issue in issues {
            IssueValidator::validate(issue).map_err(TrackerError::from_validation_errors)?;
        }

        let cleared = self.mutate("load_dataset", |tx| {
            let cleared = if replace {
                tx.execute("DELETE FROM projects", [])?
            } else {
                0
            };
            for project in projects {
                insert_project_row(tx, project)?;
            }
            for issue in issues {
                if !project_exists(tx, &issue.project_id)? {
                    return Err(TrackerError::ProjectNotFound {
                        id: issue.project_id.clone(),
                    });
                }
                insert_issue_row(tx, issue)?;
            }
            Ok(cleared)
        })?;

        tracing::info!(
            cleared,
            projects = projects.len(),
            issues = issues.len(),
            "Loaded dataset"
        );
        Ok(cleared)
    }

    // ========================================================================
    // ISSUES
    // ========================================================================

    /// Create an issue in a project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` for an unknown project, a validation error for
    /// an invalid issue, or a database error.
    pub fn create_issue(&mut self, project_id: &str, input: &NewIssue) -> Result<IssueWithProject> {
        self.create_issue_at(project_id, input, Utc::now())
    }

    /// Create an issue with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_issue`].
    pub fn create_issue_at(
        &mut self,
        project_id: &str,
        input: &NewIssue,
        now: DateTime<Utc>,
    ) -> Result<IssueWithProject> {
        let project = self
            .get_project(project_id)?
            .ok_or_else(|| TrackerError::ProjectNotFound {
                id: project_id.to_string(),
            })?;

        let issue = Issue {
            id: generate_id(),
            project_id: project.id.clone(),
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            status: input.status.unwrap_or_default(),
            priority: input.priority,
            issue_type: input.issue_type,
            assignee: input.assignee.clone(),
            reporter: input.reporter.clone(),
            epic: input.epic.clone(),
            story_points: input.story_points,
            created_at: now,
            updated_at: now,
            start_date: input.start_date,
            due_date: input.due_date,
        };

        self.insert_issue(&issue)?;
        Ok(IssueWithProject { issue, project })
    }

    /// Insert a fully-formed issue, keeping its ID and timestamps.
    ///
    /// Used by seeding and fixtures that need control over `createdAt`/`updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid issue, `ProjectNotFound` if the
    /// owning project does not exist, or a database error.
    pub fn insert_issue(&mut self, issue: &Issue) -> Result<()> {
        IssueValidator::validate(issue).map_err(TrackerError::from_validation_errors)?;

        if self.get_project(&issue.project_id)?.is_none() {
            return Err(TrackerError::ProjectNotFound {
                id: issue.project_id.clone(),
            });
        }

        self.mutate("insert_issue", |tx| insert_issue_row(tx, issue))?;

        tracing::debug!(id = %issue.id, project_id = %issue.project_id, "Inserted issue");
        Ok(())
    }

    /// List issues (with their projects), newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_issues(&self, filters: &ListFilters) -> Result<Vec<IssueWithProject>> {
        let mut sql = format!(
            "SELECT {ISSUE_COLUMNS}, {PROJECT_COLUMNS}
             FROM issues i JOIN projects p ON p.id = i.project_id WHERE 1=1"
        );

        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref project_id) = filters.project_id {
            sql.push_str(" AND i.project_id = ?");
            params.push(Box::new(project_id.clone()));
        }

        if let Some(status) = filters.status {
            sql.push_str(" AND i.status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(priority) = filters.priority {
            sql.push_str(" AND i.priority = ?");
            params.push(Box::new(priority.as_str()));
        }

        if let Some(issue_type) = filters.issue_type {
            sql.push_str(" AND i.issue_type = ?");
            params.push(Box::new(issue_type.as_str()));
        }

        if let Some(ref assignee) = filters.assignee {
            sql.push_str(" AND i.assignee = ?");
            params.push(Box::new(assignee.clone()));
        }

        if let Some(ref epic) = filters.epic {
            sql.push_str(" AND i.epic = ?");
            params.push(Box::new(epic.clone()));
        }

        if let Some(ref search) = filters.search {
            let needle = search.trim();
            if !needle.is_empty() {
                sql.push_str(" AND i.title LIKE ? ESCAPE '\\'");
                params.push(Box::new(format!("%{}%", escape_like(needle))));
            }
        }

        sql.push_str(" ORDER BY i.created_at DESC, i.rowid DESC");

        if let Some(limit) = filters.limit {
            if limit > 0 {
                sql.push_str(" LIMIT ?");
                params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let issues = stmt
            .query_map(params_refs.as_slice(), issue_with_project_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(count = issues.len(), ?filters, "Listed issues");
        Ok(issues)
    }

    /// Issues owned by a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn issues_for_project(&self, project_id: &str) -> Result<Vec<Issue>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues i WHERE i.project_id = ?
             ORDER BY i.created_at DESC, i.rowid DESC"
        ))?;
        let issues = stmt
            .query_map([project_id], issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Get an issue (with its project) by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_issue(&self, id: &str) -> Result<Option<IssueWithProject>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS}, {PROJECT_COLUMNS}
             FROM issues i JOIN projects p ON p.id = i.project_id WHERE i.id = ?"
        );

        let result = self
            .conn
            .query_row(&sql, [id], issue_with_project_from_row);

        match result {
            Ok(issue) => Ok(Some(issue)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a partial update to an issue. Always refreshes `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` for an unknown ID, a validation error if the
    /// merged issue is invalid, or a database error.
    pub fn update_issue(&mut self, id: &str, update: &IssueUpdate) -> Result<IssueWithProject> {
        self.update_issue_at(id, update, Utc::now())
    }

    /// Apply a partial update with an explicit clock reading.
    ///
    /// `updatedAt` becomes `max(now, previous updatedAt)` so it never moves backwards.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_issue`].
    pub fn update_issue_at(
        &mut self,
        id: &str,
        update: &IssueUpdate,
        now: DateTime<Utc>,
    ) -> Result<IssueWithProject> {
        let IssueWithProject { mut issue, project } = self
            .get_issue(id)?
            .ok_or_else(|| TrackerError::IssueNotFound { id: id.to_string() })?;

        update.apply_to(&mut issue);
        issue.title = issue.title.trim().to_string();
        issue.updated_at = now.max(issue.updated_at);

        IssueValidator::validate(&issue).map_err(TrackerError::from_validation_errors)?;

        self.mutate("update_issue", |tx| {
            tx.execute(
                "UPDATE issues SET
                    title = ?, description = ?, status = ?, priority = ?, issue_type = ?,
                    assignee = ?, reporter = ?, epic = ?, story_points = ?,
                    updated_at = ?, start_date = ?, due_date = ?
                 WHERE id = ?",
                rusqlite::params![
                    issue.title,
                    issue.description,
                    issue.status.as_str(),
                    issue.priority.map(|p| p.as_str()),
                    issue.issue_type.map(|t| t.as_str()),
                    issue.assignee,
                    issue.reporter,
                    issue.epic,
                    issue.story_points,
                    format_timestamp(&issue.updated_at),
                    issue.start_date.as_ref().map(format_timestamp),
                    issue.due_date.as_ref().map(format_timestamp),
                    id,
                ],
            )?;
            Ok(())
        })?;

        tracing::info!(id, status = %issue.status, "Updated issue");
        Ok(IssueWithProject { issue, project })
    }

    /// Delete an issue.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` for an unknown ID, or a database error.
    pub fn delete_issue(&mut self, id: &str) -> Result<()> {
        let deleted = self.mutate("delete_issue", |tx| {
            Ok(tx.execute("DELETE FROM issues WHERE id = ?", [id])?)
        })?;

        if deleted == 0 {
            return Err(TrackerError::IssueNotFound { id: id.to_string() });
        }
        tracing::info!(id, "Deleted issue");
        Ok(())
    }

    /// Count all issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_issues(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM issues", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Count all projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_projects(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM projects", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

}

fn insert_project_row(tx: &Transaction, project: &Project) -> Result<()> {
    tx.execute(
        "INSERT INTO projects (id, name, description, key, created_at)
         VALUES (?, ?, ?, ?, ?)",
        rusqlite::params![
            project.id,
            project.name,
            project.description,
            project.key,
            format_timestamp(&project.created_at),
        ],
    )?;
    Ok(())
}

fn insert_issue_row(tx: &Transaction, issue: &Issue) -> Result<()> {
    tx.execute(
        "INSERT INTO issues (
            id, project_id, title, description, status, priority, issue_type,
            assignee, reporter, epic, story_points,
            created_at, updated_at, start_date, due_date
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            issue.id,
            issue.project_id,
            issue.title,
            issue.description,
            issue.status.as_str(),
            issue.priority.map(|p| p.as_str()),
            issue.issue_type.map(|t| t.as_str()),
            issue.assignee,
            issue.reporter,
            issue.epic,
            issue.story_points,
            format_timestamp(&issue.created_at),
            format_timestamp(&issue.updated_at),
            issue.start_date.as_ref().map(format_timestamp),
            issue.due_date.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(())
}

fn project_exists(tx: &Transaction, id: &str) -> Result<bool> {
    let found = tx
        .query_row("SELECT 1 FROM projects WHERE id = ?", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn enum_column<T>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = TrackerError>,
{
    row.get::<_, Option<String>>(idx)?
        .map(|raw| raw.parse::<T>().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_stored_timestamp(&raw).map_err(|e| conversion_error(idx, e))
}

fn optional_timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| parse_stored_timestamp(&raw).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn issue_from_row(row: &Row) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: enum_column::<Status>(row, 4)?.unwrap_or_default(),
        priority: enum_column(row, 5)?,
        issue_type: enum_column(row, 6)?,
        assignee: row.get(7)?,
        reporter: row.get(8)?,
        epic: row.get(9)?,
        story_points: row.get(10)?,
        created_at: timestamp_column(row, 11)?,
        updated_at: timestamp_column(row, 12)?,
        start_date: optional_timestamp_column(row, 13)?,
        due_date: optional_timestamp_column(row, 14)?,
    })
}

fn project_from_row(row: &Row, offset: usize) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        key: row.get(offset + 3)?,
        created_at: timestamp_column(row, offset + 4)?,
    })
}

fn issue_with_project_from_row(row: &Row) -> rusqlite::Result<IssueWithProject> {
    Ok(IssueWithProject {
        issue: issue_from_row(row)?,
        project: project_from_row(row, JOINED_PROJECT_OFFSET)?,
    })
}
