//! Database schema definitions.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the bugboard database.
pub const SCHEMA_SQL: &str = r"
    -- Projects: aggregate root
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        key TEXT,
        created_at TEXT NOT NULL,
        CHECK (length(name) >= 1)
    );

    CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at);

    -- Issues: owned by exactly one project
    CREATE TABLE IF NOT EXISTS issues (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'TO_DO',
        priority TEXT,
        issue_type TEXT,
        assignee TEXT,
        reporter TEXT,
        epic TEXT,
        story_points INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        start_date TEXT,
        due_date TEXT,
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
        CHECK (length(title) >= 1 AND length(title) <= 500),
        CHECK (status IN ('TO_DO', 'IN_PROGRESS', 'IN_REVIEW', 'DONE')),
        CHECK (priority IS NULL OR priority IN ('LOW', 'MEDIUM', 'HIGH', 'CRITICAL')),
        CHECK (issue_type IS NULL OR issue_type IN ('TASK', 'BUG', 'FEATURE', 'STORY', 'EPIC')),
        CHECK (story_points IS NULL OR story_points >= 0),
        CHECK (updated_at >= created_at)
    );

    CREATE INDEX IF NOT EXISTS idx_issues_project_id ON issues(project_id);
    CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
    CREATE INDEX IF NOT EXISTS idx_issues_assignee ON issues(assignee);
    CREATE INDEX IF NOT EXISTS idx_issues_epic ON issues(epic);
    CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at);
";

/// Apply the schema to the database.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Cascading deletes depend on this
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}
