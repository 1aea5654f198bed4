use super::{ApiError, AppState, DEGRADED_HEADER};
use crate::domain::model::{AnalysisRequest, DoctorList, DoctorQuery};
use crate::utils::error::AdvisorError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

pub const LIVENESS_TEXT: &str = "Backend Running ✔";

/// GET /
pub async fn root() -> &'static str {
    LIVENESS_TEXT
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub doctors_loaded: usize,
    pub directory_fallback: bool,
    pub started_at: String,
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.started_at);

    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        provider: state.gateway.provider_name().to_string(),
        doctors_loaded: state.directory.len(),
        directory_fallback: state.directory.is_fallback(),
        started_at: state.started_at.to_rfc3339(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
    })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/analyze
///
/// Upstream failures never surface as errors here: the client receives the
/// degraded result with `x-analysis-degraded: true`. Only malformed requests
/// get a 4xx.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let (image, mime_type) = match (present(request.base64_image), present(request.mime_type)) {
        (Some(image), Some(mime_type)) => (image, mime_type),
        _ => return Err(ApiError::BadRequest("Missing image data".to_string())),
    };

    match state.gateway.analyze(&image, &mime_type).await {
        Ok(result) => Ok(Json(result).into_response()),
        Err(AdvisorError::InvalidInput { message }) => {
            tracing::info!(reason = %message, "Rejected analysis request");
            Err(ApiError::BadRequest(message))
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                category = ?e.category(),
                suggestion = e.recovery_suggestion(),
                "Analysis failed, returning degraded result"
            );
            let mut response = Json(state.gateway.degraded()).into_response();
            response
                .headers_mut()
                .insert(DEGRADED_HEADER, HeaderValue::from_static("true"));
            Ok(response)
        }
    }
}

/// POST /api/doctors
pub async fn find_doctors(
    State(state): State<AppState>,
    payload: Result<Json<DoctorQuery>, JsonRejection>,
) -> Result<Json<DoctorList>, ApiError> {
    let Json(query) = payload?;

    let doctors = state.directory.find(query.location.as_deref());
    tracing::debug!(
        location = query.location.as_deref().unwrap_or(""),
        specialty = query.specialty.as_deref().unwrap_or(""),
        returned = doctors.len(),
        "Directory lookup"
    );

    Ok(Json(DoctorList { doctors }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
