//! HTTP API tests driven through the router with `oneshot`.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bugboard::server::{StoreHandle, build_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    build_router(StoreHandle::new(common::test_db()), false)
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_project(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/projects",
        Some(json!({"name": name, "key": "BUG"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn project_lifecycle() {
    let app = app();
    let id = create_project(&app, "Tracker").await;

    let (status, listed) = send(&app, "GET", "/api/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["issues"], json!([]));

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/projects/{id}"),
        Some(json!({"description": "Bugs live here", "key": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Bugs live here");
    assert!(updated["key"].is_null());
    assert_eq!(updated["name"], "Tracker");

    let (status, body) = send(&app, "DELETE", &format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = send(&app, "GET", &format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PROJECT_NOT_FOUND");
}

#[tokio::test]
async fn issue_lifecycle() {
    let app = app();
    let project_id = create_project(&app, "Tracker").await;

    let (status, created) = send(
        &app,
        "POST",
        &format!("/api/issues/{project_id}"),
        Some(json!({
            "title": "Login button misaligned",
            "priority": "HIGH",
            "type": "BUG",
            "assignee": "Ann",
            "epic": "Mobile",
            "storyPoints": 3,
            "dueDate": "2030-01-15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "TO_DO");
    assert_eq!(created["type"], "BUG");
    assert_eq!(created["project"]["id"], project_id.as_str());
    assert_eq!(created["createdAt"], created["updatedAt"]);
    let issue_id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, "GET", &format!("/api/issues/{issue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/issues/{issue_id}"),
        Some(json!({"status": "IN_REVIEW", "assignee": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "IN_REVIEW");
    assert!(updated["assignee"].is_null());
    assert_eq!(updated["epic"], "Mobile");

    let (status, _) = send(&app, "DELETE", &format!("/api/issues/{issue_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/api/issues/{issue_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nested_create_route_matches_flat_route() {
    let app = app();
    let project_id = create_project(&app, "Tracker").await;

    let (status, created) = send(
        &app,
        "POST",
        &format!("/api/projects/{project_id}/issues"),
        Some(json!({"title": "Nested"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["projectId"], project_id.as_str());
}

#[tokio::test]
async fn create_issue_validation_errors() {
    let app = app();
    let project_id = create_project(&app, "Tracker").await;
    let uri = format!("/api/issues/{project_id}");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"title": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"title": "x", "priority": "urgent"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PRIORITY");
    assert_eq!(body["hint"], "Did you mean CRITICAL?");

    let (status, body) = send(
        &app,
        "POST",
        "/api/issues/no-such-project",
        Some(json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PROJECT_NOT_FOUND");
}

#[tokio::test]
async fn list_issues_with_filters() {
    let app = app();
    let first = create_project(&app, "First").await;
    let second = create_project(&app, "Second").await;

    for (project, title, status) in [
        (&first, "one", "TO_DO"),
        (&first, "two", "DONE"),
        (&second, "three", "DONE"),
    ] {
        let (code, _) = send(
            &app,
            "POST",
            &format!("/api/issues/{project}"),
            Some(json!({"title": title, "status": status})),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, all) = send(&app, "GET", "/api/issues", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, done) = send(&app, "GET", "/api/issues?status=DONE", None).await;
    assert_eq!(done.as_array().unwrap().len(), 2);

    let (_, scoped) = send(
        &app,
        "GET",
        &format!("/api/issues?projectId={first}&status=DONE"),
        None,
    )
    .await;
    let scoped = scoped.as_array().unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0]["title"], "two");

    let (status, body) = send(&app, "GET", "/api/issues?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn statistics_endpoint() {
    let app = app();
    let project_id = create_project(&app, "Stats").await;

    for (title, status, assignee) in [
        ("a", "DONE", "Ann"),
        ("b", "IN_PROGRESS", "Ann"),
        ("c", "TO_DO", "Bob"),
    ] {
        send(
            &app,
            "POST",
            &format!("/api/issues/{project_id}"),
            Some(json!({"title": title, "status": status, "assignee": assignee, "epic": "Core"})),
        )
        .await;
    }

    let (status, report) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}/statistics"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["project"]["id"], project_id.as_str());
    assert_eq!(report["stats"]["updated"], 3);
    assert_eq!(report["stats"]["created"], 3);
    assert_eq!(report["stats"]["completed"], 1);
    assert_eq!(
        report["statusDistribution"],
        json!({"todo": 1, "progress": 1, "review": 0, "done": 1})
    );
    assert_eq!(report["teamWorkload"], json!({"Ann": 2, "Bob": 1}));
    assert_eq!(
        report["epicProgress"],
        json!({"Core": {"total": 3, "completed": 1}})
    );
}

#[tokio::test]
async fn empty_assignee_and_epic_are_not_grouped() {
    let app = app();
    let project_id = create_project(&app, "Blank labels").await;

    let (status, created) = send(
        &app,
        "POST",
        &format!("/api/issues/{project_id}"),
        Some(json!({"title": "a", "assignee": "", "epic": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["assignee"].is_null());
    assert!(created["epic"].is_null());

    let (status, other) = send(
        &app,
        "POST",
        &format!("/api/issues/{project_id}"),
        Some(json!({"title": "b", "assignee": "Ann", "epic": "Core"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let other_id = other["id"].as_str().unwrap().to_string();

    let (status, cleared) = send(
        &app,
        "PUT",
        &format!("/api/issues/{other_id}"),
        Some(json!({"assignee": "", "epic": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["assignee"].is_null());
    assert!(cleared["epic"].is_null());

    let (_, report) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}/statistics"),
        None,
    )
    .await;
    assert_eq!(report["teamWorkload"], json!({}));
    assert_eq!(report["epicProgress"], json!({}));
}
