//! Stats command implementation.
//!
//! Prints the same report the `/api/projects/{id}/statistics` endpoint
//! returns, or a plain-text summary of it.

use crate::cli::{OutputMode, StatsArgs};
use crate::config::{Settings, open_storage};
use crate::error::Result;
use crate::stats::{self, ProjectReport};
use chrono::Utc;
use tracing::info;

/// Execute the stats command.
///
/// # Errors
///
/// Returns `ProjectNotFound` for an unknown project, or an error if the
/// database cannot be opened or queried.
pub fn execute(args: &StatsArgs, mode: OutputMode, settings: &Settings) -> Result<()> {
    let storage = open_storage(settings)?;
    let report = stats::project_statistics(&storage, &args.project_id, Utc::now())?;
    info!(
        project_id = %args.project_id,
        issues = report.project.issues.len(),
        "Computed project statistics"
    );

    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputMode::Text => print_text_output(&report),
        OutputMode::Quiet => {}
    }
    Ok(())
}

fn print_text_output(report: &ProjectReport) {
    let project = &report.project.project;
    let s = &report.statistics;

    match &project.key {
        Some(key) => println!("{} ({key})", project.name),
        None => println!("{}", project.name),
    }
    println!("{}\n", "=".repeat(project.name.chars().count().max(18)));

    println!("Last 7 days:");
    println!("  Completed:   {}", s.stats.completed);
    println!("  Updated:     {}", s.stats.updated);
    println!("  Created:     {}", s.stats.created);
    println!("  Due soon:    {}", s.stats.due_soon);

    let status = &s.status_distribution;
    println!("\nBy status ({} issues):", status.total());
    println!("  To do:       {}", status.todo);
    println!("  In progress: {}", status.progress);
    println!("  In review:   {}", status.review);
    println!("  Done:        {}", status.done);

    let priority = &s.priority_distribution;
    if priority.total() > 0 {
        println!("\nBy priority:");
        println!("  Critical:    {}", priority.critical);
        println!("  High:        {}", priority.high);
        println!("  Medium:      {}", priority.medium);
        println!("  Low:         {}", priority.low);
    }

    let types = &s.type_distribution;
    if types.total() > 0 {
        println!("\nBy type:");
        println!("  Task:        {}", types.task);
        println!("  Bug:         {}", types.bug);
        println!("  Feature:     {}", types.feature);
        println!("  Story:       {}", types.story);
        println!("  Epic:        {}", types.epic);
    }

    if !s.team_workload.is_empty() {
        println!("\nTeam workload:");
        for (assignee, count) in &s.team_workload {
            println!("  {assignee}: {count}");
        }
    }

    if !s.epic_progress.is_empty() {
        println!("\nEpic progress:");
        for (epic, progress) in &s.epic_progress {
            println!("  {epic}: {}/{} done", progress.completed, progress.total);
        }
    }
}
