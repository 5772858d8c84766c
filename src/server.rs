//! HTTP API server exposing the pipeline over axum
//!
//! Every route is a thin wrapper over the same library calls the CLI uses.
//! Errors map onto status codes by kind: lookup failures are 404, bad
//! requests 400, an empty history 409, anything else 500.

use crate::dataset::{Dataset, ExecutionOutcome, RollbackOutcome, UndoOutcome, VersionListing};
use crate::error::{PreplineError, Result};
use crate::ingest::{self, DatasetMetadata};
use crate::ledger::LedgerRecord;
use crate::report::{self, ReportArtifacts, RescoreResult};
use crate::score::{self, QualityReport};
use crate::workspace::PreplineWorkspace;
use axum::body::Bytes;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

#[derive(Clone)]
struct AppState {
    workspace: PreplineWorkspace,
}

/// Wraps library errors for conversion into HTTP responses
struct ApiError(PreplineError);

impl From<PreplineError> for ApiError {
    fn from(err: PreplineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PreplineError::DatasetNotFound { .. } | PreplineError::VersionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            PreplineError::EmptyHistory => StatusCode::CONFLICT,
            PreplineError::InvalidParameter { .. }
            | PreplineError::UnsupportedAction { .. }
            | PreplineError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("Request failed: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn router(workspace: PreplineWorkspace) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/analyze/:dataset_id", get(analyze))
        .route("/execute/:dataset_id", post(execute))
        .route("/versions/:dataset_id", get(versions))
        .route("/log/:dataset_id", get(log_route))
        .route("/rollback/:dataset_id", post(rollback))
        .route("/undo/:dataset_id", post(undo))
        .route("/rescore/:dataset_id", get(rescore))
        .route("/report/:dataset_id", post(generate_report))
        .route("/download/:dataset_id", get(download))
        .with_state(AppState { workspace })
}

/// Run the server until interrupted
pub fn serve(workspace_path: Option<&Path>, port: u16) -> Result<()> {
    let workspace = PreplineWorkspace::find_or_create(workspace_path)?;
    let app = router(workspace);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        log::info!("Listening on port {}", port);
        axum::serve(listener, app).await?;
        Ok(())
    })
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "prepline",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: String,
}

async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<DatasetMetadata>)> {
    let metadata = ingest::ingest_csv(&state.workspace, &query.filename, &body)?;
    Ok((StatusCode::CREATED, Json(metadata)))
}

#[derive(Deserialize)]
struct AnalyzeQuery {
    target: Option<String>,
    version: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
    Query(query): Query<AnalyzeQuery>,
) -> ApiResult<Json<QualityReport>> {
    let dataset = Dataset::open(&state.workspace, &dataset_id)?;
    let (_, frame) = dataset.read_frame(query.version.as_deref())?;
    Ok(Json(score::compute_quality_score(
        &frame,
        &dataset_id,
        query.target.as_deref(),
    )))
}

#[derive(Deserialize)]
struct ExecuteRequest {
    action: String,
    #[serde(default)]
    params: IndexMap<String, serde_json::Value>,
}

async fn execute(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
    Json(request): Json<ExecuteRequest>,
) -> ApiResult<Json<ExecutionOutcome>> {
    let mut dataset = Dataset::open(&state.workspace, &dataset_id)?;
    Ok(Json(dataset.execute(&request.action, &request.params)?))
}

async fn versions(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
) -> ApiResult<Json<VersionListing>> {
    let dataset = Dataset::open(&state.workspace, &dataset_id)?;
    Ok(Json(dataset.versions()?))
}

async fn log_route(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
) -> ApiResult<Json<Vec<LedgerRecord>>> {
    let dataset = Dataset::open(&state.workspace, &dataset_id)?;
    Ok(Json(dataset.log()?))
}

#[derive(Deserialize)]
struct RollbackRequest {
    version: String,
}

async fn rollback(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
    Json(request): Json<RollbackRequest>,
) -> ApiResult<Json<RollbackOutcome>> {
    let mut dataset = Dataset::open(&state.workspace, &dataset_id)?;
    Ok(Json(dataset.rollback(&request.version)?))
}

async fn undo(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
) -> ApiResult<Json<UndoOutcome>> {
    let mut dataset = Dataset::open(&state.workspace, &dataset_id)?;
    Ok(Json(dataset.undo()?))
}

#[derive(Deserialize)]
struct TargetQuery {
    target: Option<String>,
}

async fn rescore(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
    Query(query): Query<TargetQuery>,
) -> ApiResult<Json<RescoreResult>> {
    let dataset = Dataset::open(&state.workspace, &dataset_id)?;
    Ok(Json(report::rescore_dataset(
        &dataset,
        query.target.as_deref(),
    )?))
}

async fn generate_report(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
    Query(query): Query<TargetQuery>,
) -> ApiResult<Json<ReportArtifacts>> {
    let dataset = Dataset::open(&state.workspace, &dataset_id)?;
    Ok(Json(report::generate_report(
        &state.workspace,
        &dataset,
        query.target.as_deref(),
    )?))
}

#[derive(Deserialize)]
struct DownloadQuery {
    version: Option<String>,
}

async fn download(
    State(state): State<AppState>,
    UrlPath(dataset_id): UrlPath<String>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let dataset = Dataset::open(&state.workspace, &dataset_id)?;
    let (snapshot, _) = dataset.read_frame(query.version.as_deref())?;
    let data = dataset.store().read(&snapshot)?;

    let disposition = format!("attachment; filename=\"{}\"", snapshot.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                PreplineError::dataset_not_found("x"),
                StatusCode::NOT_FOUND,
            ),
            (
                PreplineError::version_not_found("v9"),
                StatusCode::NOT_FOUND,
            ),
            (PreplineError::EmptyHistory, StatusCode::CONFLICT),
            (
                PreplineError::unsupported_action("one_hot_encode"),
                StatusCode::BAD_REQUEST,
            ),
            (
                PreplineError::invalid_input("bad csv"),
                StatusCode::BAD_REQUEST,
            ),
            (
                PreplineError::corrupt_store("vX.csv"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
