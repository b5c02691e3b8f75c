//! System API endpoints: health probes and a status summary.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, AppState, SystemStatus};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

/// `GET /api/system/health/live`
///
/// Lightweight liveness probe to indicate the API process is running.
pub async fn health_live() -> impl IntoResponse {
    Json(HealthLiveResponse { status: "alive" })
}

/// `GET /api/system/health/ready`
///
/// Readiness probe that checks database connectivity.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = state.shared.store.ping().await.is_ok();

    let status = if db_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthReadyResponse {
            ready: db_ready,
            checks: HealthReadinessChecks { database: db_ready },
        }),
    )
        .into_response()
}

/// `GET /api/system/status`
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<SystemStatus>, ApiError> {
    let config = &state.shared.config;
    let configured = |key: Option<&String>| key.is_some_and(|k| !k.trim().is_empty());

    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        cache_entries: state.shared.store.count_cache_entries().await?,
        weather_configured: configured(config.weather.api_key.as_ref()),
        ocr_configured: configured(config.ocr.api_key.as_ref()),
        llm_configured: configured(config.llm.api_key.as_ref()),
        sms_configured: configured(config.sms.account_sid.as_ref())
            && configured(config.sms.auth_token.as_ref()),
    }))
}
