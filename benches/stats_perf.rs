// Statistics and storage performance benchmarks.
//
// Run with: cargo bench
//
// Performance Targets:
// | Operation                | Target  | Description                          |
// |--------------------------|---------|--------------------------------------|
// | Aggregate (1k)           | < 1ms   | compute_statistics over 1000 issues  |
// | Aggregate (10k)          | < 10ms  | compute_statistics over 10000 issues |
// | Project report (1k)      | < 20ms  | Load project + issues, then aggregate|
// | List issues (1k)         | < 10ms  | Unfiltered list with joined project  |

use bugboard::model::{Issue, IssueType, NewProject, Priority, Status};
use bugboard::stats::{compute_statistics, project_statistics};
use bugboard::storage::{ListFilters, SqliteStorage};
use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Once;
use tempfile::TempDir;
use tracing::info;

static INIT: Once = Once::new();

fn init_bench_logging() {
    INIT.call_once(bugboard::logging::init_test_logging);
}

fn bench_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

const ASSIGNEES: [&str; 5] = ["Ann", "Bob", "Cy", "Dee", "Eve"];
const EPICS: [&str; 4] = ["Mobile", "Payments", "Search", "Onboarding"];

/// Create a synthetic issue with the given index.
fn create_test_issue(project_id: &str, i: usize) -> Issue {
    let hours = i64::try_from(i % 720).expect("offset fits i64");
    let created_at = bench_now() - Duration::hours(hours + 24);
    Issue {
        id: format!("bench-{i:06}"),
        project_id: project_id.to_string(),
        title: format!("Benchmark issue {i}"),
        description: Some(format!("Description for benchmark issue {i}")),
        status: Status::ALL[i % Status::ALL.len()],
        priority: (i % 7 != 0).then(|| Priority::ALL[i % Priority::ALL.len()]),
        issue_type: (i % 9 != 0).then(|| IssueType::ALL[i % IssueType::ALL.len()]),
        assignee: (i % 3 != 0).then(|| ASSIGNEES[i % ASSIGNEES.len()].to_string()),
        reporter: None,
        epic: (i % 2 == 0).then(|| EPICS[i % EPICS.len()].to_string()),
        story_points: Some(u32::try_from(i % 13).expect("points fit u32")),
        created_at,
        updated_at: created_at + Duration::hours(hours / 2),
        start_date: None,
        due_date: Some(bench_now() + Duration::hours(hours - 240)),
    }
}

fn synthetic_issues(count: usize) -> Vec<Issue> {
    (0..count).map(|i| create_test_issue("bench", i)).collect()
}

/// Set up a database holding one project with `count` issues.
fn setup_db_with_issues(count: usize) -> (TempDir, SqliteStorage, String) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("bench.db");
    let mut storage = SqliteStorage::open(&db_path).expect("Failed to open db");

    let project = storage
        .create_project_at(
            &NewProject {
                name: "Benchmark".to_string(),
                ..NewProject::default()
            },
            bench_now() - Duration::days(60),
        )
        .expect("Failed to create project");

    for i in 0..count {
        storage
            .insert_issue(&create_test_issue(&project.id, i))
            .expect("Failed to insert issue");
    }

    (dir, storage, project.id)
}

// =============================================================================
// Aggregation Benchmarks
// =============================================================================

fn bench_compute_statistics(c: &mut Criterion) {
    init_bench_logging();
    let mut group = c.benchmark_group("stats/compute");

    for size in [100_usize, 1_000, 10_000] {
        let issues = synthetic_issues(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &issues, |b, issues| {
            b.iter(|| compute_statistics(black_box(issues), bench_now()));
        });
    }

    group.finish();
    info!("stats/compute finished");
}

// =============================================================================
// Storage Benchmarks
// =============================================================================

fn bench_project_report(c: &mut Criterion) {
    init_bench_logging();
    let mut group = c.benchmark_group("stats/project_report");

    for size in [100_usize, 1_000] {
        let (_dir, storage, project_id) = setup_db_with_issues(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &project_id, |b, id| {
            b.iter(|| project_statistics(&storage, black_box(id), bench_now()).unwrap());
        });
    }

    group.finish();
}

fn bench_list_issues(c: &mut Criterion) {
    init_bench_logging();
    let mut group = c.benchmark_group("storage/list");
    let (_dir, storage, project_id) = setup_db_with_issues(1_000);

    group.bench_function("all", |b| {
        b.iter(|| storage.list_issues(black_box(&ListFilters::default())).unwrap());
    });

    let filters = ListFilters {
        project_id: Some(project_id),
        status: Some(Status::InProgress),
        assignee: Some("Ann".to_string()),
        ..ListFilters::default()
    };
    group.bench_function("filtered", |b| {
        b.iter(|| storage.list_issues(black_box(&filters)).unwrap());
    });

    group.finish();
}

criterion_group!(stats_benches, bench_compute_statistics, bench_project_report);
criterion_group!(storage_benches, bench_list_issues);
criterion_main!(stats_benches, storage_benches);
