//! Projects command implementation.

use crate::cli::OutputMode;
use crate::config::{Settings, open_storage};
use crate::error::Result;
use crate::model::{ProjectWithIssues, Status};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRow<'a> {
    id: &'a str,
    key: Option<&'a str>,
    name: &'a str,
    issue_count: usize,
    open_count: usize,
}

impl<'a> From<&'a ProjectWithIssues> for ProjectRow<'a> {
    fn from(entry: &'a ProjectWithIssues) -> Self {
        Self {
            id: &entry.project.id,
            key: entry.project.key.as_deref(),
            name: &entry.project.name,
            issue_count: entry.issues.len(),
            open_count: entry
                .issues
                .iter()
                .filter(|issue| issue.status != Status::Done)
                .count(),
        }
    }
}

/// List projects with their issue counts, newest first.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or queried.
pub fn execute(mode: OutputMode, settings: &Settings) -> Result<()> {
    let storage = open_storage(settings)?;
    let projects = storage.list_projects()?;
    let rows: Vec<ProjectRow<'_>> = projects.iter().map(ProjectRow::from).collect();

    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        OutputMode::Quiet => return Ok(()),
        OutputMode::Text => {}
    }

    if rows.is_empty() {
        println!("No projects. Run `bugboard seed` to load sample data.");
        return Ok(());
    }

    for row in &rows {
        println!(
            "{:<8} {:<36} {:<32} {:>3} issues ({} open)",
            row.key.unwrap_or("-"),
            row.id,
            row.name,
            row.issue_count,
            row.open_count
        );
    }
    Ok(())
}
