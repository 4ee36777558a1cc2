//! JSON HTTP API for the dashboard.
//!
//! Each handler calls straight into the engine and serializes the plain
//! result. Chart rendering and HTML pages are the browser's business; the
//! tabular endpoints return rows.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/stats` | Corpus statistics |
//! | `GET`  | `/api/courts` | Document counts per court |
//! | `GET`  | `/api/years` | Document counts per year |
//! | `GET`  | `/api/metrics` | Page count and size per document |
//! | `GET`  | `/api/recent?limit=N` | Most recently added documents |
//! | `GET`  | `/api/document/{ecli_id}` | Document detail |
//! | `GET`  | `/api/search?court=&year=&min_pages=&max_pages=` | Filtered search |
//! | `POST` | `/api/feedback` | Submit user feedback |
//!
//! # Error Contract
//!
//! ```json
//! {
//!   "error": {
//!     "code": "bad_request",
//!     "message": "invalid value for min_pages: \"x\" is not an integer"
//!   }
//! }
//! ```
//!
//! Malformed query strings and request bodies use the same shape.
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `store_unavailable` (503), `internal` (500).

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::aggregate;
use crate::config::Config;
use crate::error::Error;
use crate::feedback;
use crate::get::get_document_by_ecli_id;
use crate::models::{
    CorpusStats, CourtCount, DocumentDetail, DocumentMetricRow, DocumentSummary, DocumentView,
    FeedbackAck, FeedbackRecord, YearCount,
};
use crate::recent::get_recent_documents;
use crate::search::{search_documents, SearchFilter};
use crate::stats::get_corpus_stats;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Build the API router for the given configuration.
pub fn router(config: Config) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/stats", get(handle_stats))
        .route("/api/courts", get(handle_courts))
        .route("/api/years", get(handle_years))
        .route("/api/metrics", get(handle_metrics))
        .route("/api/recent", get(handle_recent))
        .route("/api/document/{ecli_id}", get(handle_document))
        .route("/api/search", get(handle_search))
        .route("/api/feedback", post(handle_feedback))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind to `[server].bind` and serve until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        db = %config.db.path.display(),
        "dashboard API listening on http://{}",
        bind_addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        if err.is_client_error() {
            return bad_request(err.to_string());
        }

        match err {
            Error::StoreUnavailable { .. } => {
                tracing::error!(error = %err, "store unavailable");
                AppError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    code: "store_unavailable",
                    message: err.to_string(),
                }
            }
            other => {
                tracing::error!(error = %other, "request failed");
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "internal",
                    message: other.to_string(),
                }
            }
        }
    }
}

// ============ Handlers ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CorpusStats>, AppError> {
    Ok(Json(get_corpus_stats(&state.config).await?))
}

async fn handle_courts(State(state): State<AppState>) -> Result<Json<Vec<CourtCount>>, AppError> {
    Ok(Json(aggregate::get_documents_by_court(&state.config).await?))
}

async fn handle_years(State(state): State<AppState>) -> Result<Json<Vec<YearCount>>, AppError> {
    Ok(Json(aggregate::get_documents_by_year(&state.config).await?))
}

async fn handle_metrics(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentMetricRow>>, AppError> {
    Ok(Json(aggregate::get_document_metrics(&state.config).await?))
}

#[derive(Debug, Deserialize)]
struct RecentParams {
    limit: Option<u32>,
}

async fn handle_recent(
    State(state): State<AppState>,
    params: Result<Query<RecentParams>, QueryRejection>,
) -> Result<Json<Vec<DocumentSummary>>, AppError> {
    let Query(params) = params?;
    let requested = params.limit.unwrap_or(state.config.dashboard.recent_limit);
    let limit =
        NonZeroU32::new(requested).ok_or_else(|| bad_request("limit must be a positive integer"))?;

    Ok(Json(get_recent_documents(&state.config, limit).await))
}

async fn handle_document(
    State(state): State<AppState>,
    Path(ecli_id): Path<String>,
) -> Result<Json<DocumentDetail>, AppError> {
    get_document_by_ecli_id(&state.config, &ecli_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Document not found"))
}

async fn handle_search(
    State(state): State<AppState>,
    filter: Result<Query<SearchFilter>, QueryRejection>,
) -> Result<Json<Vec<DocumentView>>, AppError> {
    let Query(filter) = filter?;
    Ok(Json(search_documents(&state.config, &filter).await?))
}

async fn handle_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<FeedbackRecord>, JsonRejection>,
) -> Result<Json<FeedbackAck>, AppError> {
    let Json(mut record) = body?;
    if record.is_empty() {
        return Err(bad_request("No feedback data provided"));
    }

    if record.user_agent.is_none() {
        record.user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }

    Ok(Json(feedback::submit_feedback(&state.config, &record).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::feedback::list_feedback;
    use crate::migrate::run_migrations;
    use crate::seed::seed_sample_data;

    async fn seeded() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let config = Config::for_db(tmp.path().join("api.db"));
        run_migrations(&config).await.unwrap();
        seed_sample_data(&config).await.unwrap();
        (tmp, config)
    }

    async fn send(config: &Config, request: Request<Body>) -> (StatusCode, String, Value) {
        let response = router(config.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, content_type, body)
    }

    async fn get_json(config: &Config, uri: &str) -> (StatusCode, String, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        send(config, request).await
    }

    fn feedback_request() -> axum::http::request::Builder {
        Request::post("/api/feedback").header(CONTENT_TYPE, "application/json")
    }

    fn assert_error(response: &(StatusCode, String, Value), status: StatusCode, code: &str) {
        assert_eq!(response.0, status);
        assert!(
            response.1.starts_with("application/json"),
            "expected JSON error body, got {}",
            response.1
        );
        assert_eq!(response.2["error"]["code"], code);
        assert!(response.2["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let (_tmp, config) = seeded().await;
        let (status, _, body) = get_json(&config, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_stats_and_search() {
        let (_tmp, config) = seeded().await;

        let (status, _, body) = get_json(&config, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_documents"], 50);

        let (status, _, body) = get_json(&config, "/api/search?court=STJ&min_pages=4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_page_bound_is_bad_request() {
        let (_tmp, config) = seeded().await;
        let response = get_json(&config, "/api/search?min_pages=abc").await;
        assert_error(&response, StatusCode::BAD_REQUEST, "bad_request");
        assert!(response.2["error"]["message"]
            .as_str()
            .unwrap()
            .contains("min_pages"));
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let (_tmp, config) = seeded().await;
        let response = get_json(&config, "/api/document/ECLI_PT_NOPE_0000_000000").await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
    }

    #[tokio::test]
    async fn test_document_detail() {
        let (_tmp, config) = seeded().await;
        let (status, _, body) = get_json(&config, "/api/document/ECLI_PT_STJ_1998_000002").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ecli_id"], "ECLI_PT_STJ_1998_000002");
        assert_eq!(body["pdf_creator"], "TCPDF 6.4.2");
        assert!(body.get("pdf_metadata").is_none());
    }

    #[tokio::test]
    async fn test_missing_store_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let config = Config::for_db(tmp.path().join("absent.db"));

        let response = get_json(&config, "/api/stats").await;
        assert_error(&response, StatusCode::SERVICE_UNAVAILABLE, "store_unavailable");

        let response = get_json(&config, "/api/courts").await;
        assert_error(&response, StatusCode::SERVICE_UNAVAILABLE, "store_unavailable");
    }

    #[tokio::test]
    async fn test_recent_limit() {
        let (_tmp, config) = seeded().await;

        let (status, _, body) = get_json(&config, "/api/recent?limit=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let response = get_json(&config, "/api/recent?limit=0").await;
        assert_error(&response, StatusCode::BAD_REQUEST, "bad_request");
    }

    #[tokio::test]
    async fn test_malformed_recent_limit_uses_error_body() {
        let (_tmp, config) = seeded().await;
        let response = get_json(&config, "/api/recent?limit=abc").await;
        assert_error(&response, StatusCode::BAD_REQUEST, "bad_request");
    }

    #[tokio::test]
    async fn test_malformed_feedback_body_uses_error_body() {
        let (_tmp, config) = seeded().await;

        let request = feedback_request().body(Body::from("not json")).unwrap();
        let response = send(&config, request).await;
        assert_error(&response, StatusCode::BAD_REQUEST, "bad_request");

        let request = Request::post("/api/feedback")
            .body(Body::from(r#"{"type": "bug"}"#))
            .unwrap();
        let response = send(&config, request).await;
        assert_error(&response, StatusCode::BAD_REQUEST, "bad_request");
    }

    #[tokio::test]
    async fn test_empty_feedback_rejected() {
        let (_tmp, config) = seeded().await;
        let request = feedback_request().body(Body::from("{}")).unwrap();
        let response = send(&config, request).await;
        assert_error(&response, StatusCode::BAD_REQUEST, "bad_request");
        assert_eq!(response.2["error"]["message"], "No feedback data provided");
    }

    #[tokio::test]
    async fn test_feedback_falls_back_to_user_agent_header() {
        let (_tmp, config) = seeded().await;
        let body = r#"{"type": "bug", "rating": 4}"#;
        let request = feedback_request()
            .header(USER_AGENT, "dashboard-test/1.0")
            .body(Body::from(body))
            .unwrap();

        let (status, _, ack) = send(&config, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["success"], true);
        assert_eq!(ack["message"], "Feedback submitted successfully");

        let stored = list_feedback(&config).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_agent.as_deref(), Some("dashboard-test/1.0"));
        assert_eq!(stored[0].rating, Some(4));
    }
}
