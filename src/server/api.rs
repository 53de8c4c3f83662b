use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use super::StoreHandle;
use super::payload::{CreateIssueRequest, IssueQuery, UpdateIssueRequest};
use crate::error::{StructuredError, TrackerError};
use crate::model::{NewProject, ProjectUpdate, ProjectWithIssues};
use crate::stats::ProjectReport;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: StoreHandle,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

/// Handler error rendered as `{"error": message, "code": CODE}`.
#[derive(Debug)]
pub struct ApiError(pub TrackerError);

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(TrackerError::validation("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(TrackerError::validation("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let structured = StructuredError::from_error(&self.0);
        let status = StatusCode::from_u16(structured.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, code = structured.code.as_str(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = structured.code.as_str(), "Request rejected");
        }

        (status, Json(structured.to_http_body())).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ── Router ────────────────────────────────────────────────────────────

#[must_use]
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/statistics", get(project_statistics))
        .route("/api/projects/{id}/issues", post(create_issue))
        .route("/api/issues", get(list_issues))
        // POST treats the segment as the owning project's ID.
        .route(
            "/api/issues/{id}",
            get(get_issue)
                .post(create_issue)
                .put(update_issue)
                .delete(delete_issue),
        )
}

// ── Handlers: health ──────────────────────────────────────────────────

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "Bug Tracker API is running",
        "timestamp": Utc::now(),
    }))
}

// ── Handlers: projects ────────────────────────────────────────────────

async fn list_projects(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    let projects = state.store.call(|store| store.list_projects()).await?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<SharedState>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let project = state
        .store
        .call(move |store| store.create_project(&input))
        .await?;
    let created = ProjectWithIssues {
        project,
        issues: Vec::new(),
    };
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .store
        .call(move |store| {
            store
                .get_project_with_issues(&id)?
                .ok_or(TrackerError::ProjectNotFound { id })
        })
        .await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<ProjectUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(update) = body?;
    let project = state
        .store
        .call(move |store| store.update_project(&id, &update))
        .await?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .store
        .call(move |store| store.delete_project(&id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn project_statistics(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .store
        .call(move |store| {
            store
                .get_project_with_issues(&id)?
                .ok_or(TrackerError::ProjectNotFound { id })
        })
        .await?;

    // Aggregate outside the store lock on the owned snapshot.
    let report = ProjectReport::build(project, Utc::now());
    Ok(Json(report))
}

// ── Handlers: issues ──────────────────────────────────────────────────

async fn list_issues(
    State(state): State<SharedState>,
    query: Result<Query<IssueQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let filters = query.into_filters()?;
    let issues = state
        .store
        .call(move |store| store.list_issues(&filters))
        .await?;
    Ok(Json(issues))
}

async fn create_issue(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    body: Result<Json<CreateIssueRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let input = req.into_new_issue()?;
    let issue = state
        .store
        .call(move |store| store.create_issue(&project_id, &input))
        .await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn get_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let issue = state
        .store
        .call(move |store| {
            store
                .get_issue(&id)?
                .ok_or(TrackerError::IssueNotFound { id })
        })
        .await?;
    Ok(Json(issue))
}

async fn update_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateIssueRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let update = req.into_update()?;
    let issue = state
        .store
        .call(move |store| store.update_issue(&id, &update))
        .await?;
    Ok(Json(issue))
}

async fn delete_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.store.call(move |store| store.delete_issue(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let store = StoreHandle::new(SqliteStorage::open_memory().unwrap());
        api_router().with_state(Arc::new(AppState { store }))
    }

    async fn body_json(body: Body) -> Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["message"], "Bug Tracker API is running");
    }

    #[tokio::test]
    async fn test_create_project_requires_name() {
        let app = test_app();
        let response = app
            .oneshot(json_request("POST", "/api/projects", &json!({"name": " "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_error() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/projects")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response.into_body()).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_issue_is_404() {
        let app = test_app();
        let request = Request::builder()
            .uri("/api/issues/does-not-exist")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["code"], "ISSUE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_statistics_unknown_project_is_404() {
        let app = test_app();
        let request = Request::builder()
            .uri("/api/projects/missing/statistics")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["code"], "PROJECT_NOT_FOUND");
        assert_eq!(body["error"], "Project not found: missing");
    }

    #[tokio::test]
    async fn test_invalid_status_filter_is_400() {
        let app = test_app();
        let request = Request::builder()
            .uri("/api/issues?status=closed")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["code"], "INVALID_STATUS");
        assert_eq!(body["hint"], "Did you mean DONE?");
    }
}
