//! HTTP surface: routing, shared state and the JSON error envelope.

pub mod handlers;

use crate::core::{AnalysisGateway, DirectoryStore};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Set on `/api/analyze` responses that carry the degraded stand-in result.
pub const DEGRADED_HEADER: &str = "x-analysis-degraded";

pub const DEFAULT_BODY_LIMIT: usize = 15 * 1024 * 1024;

/// Application state shared across handlers. The directory is a ready,
/// immutable snapshot by the time this is constructed.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AnalysisGateway>,
    pub directory: Arc<DirectoryStore>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(gateway: AnalysisGateway, directory: DirectoryStore) -> Self {
        Self {
            gateway: Arc::new(gateway),
            directory: Arc::new(directory),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub body_limit: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            allowed_origins: vec![
                "https://hair-analyzer-mern.vercel.app".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

pub fn build_router(state: AppState, options: &RouterOptions) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/doctors", post(handlers::find_doctors))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(options.body_limit))
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Origins that fail to parse are skipped; configuration validation rejects
/// them before the server starts.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Every error leaves the service as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Rejected(status, msg) => (status, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::Rejected(status, rejection.body_text())
    }
}
