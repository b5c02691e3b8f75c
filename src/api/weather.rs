use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validation::{coordinates_from_json, coordinates_from_query};
use super::{ApiError, AppState, CoordinatesBody, CoordinatesQuery};
use crate::models::{AdvisoryReport, WeatherAlertsReport};
use crate::services::CachedPayload;

/// `HIT` or `MISS` on cacheable responses.
pub const CACHE_HEADER: &str = "x-cache";

/// Writes the stored JSON text as-is so cache hits are byte-identical.
pub(crate) fn payload_response(payload: CachedPayload) -> Response {
    let cache = if payload.cache_hit { "HIT" } else { "MISS" };
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static(CACHE_HEADER), cache),
        ],
        payload.body,
    )
        .into_response()
}

/// GET /api/weather/current?lat&lon
pub async fn current(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Response, ApiError> {
    let at = coordinates_from_query(query.lat.as_deref(), query.lon.as_deref())?;
    let payload = state.shared.weather_service.current(at).await?;
    Ok(payload_response(payload))
}

/// GET /api/weather/forecast?lat&lon
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Response, ApiError> {
    let at = coordinates_from_query(query.lat.as_deref(), query.lon.as_deref())?;
    let payload = state.shared.weather_service.forecast(at).await?;
    Ok(payload_response(payload))
}

/// GET /api/weather/alerts?lat&lon
pub async fn alerts_by_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<WeatherAlertsReport>, ApiError> {
    let at = coordinates_from_query(query.lat.as_deref(), query.lon.as_deref())?;
    Ok(Json(state.shared.weather_service.alerts(at).await?))
}

/// POST /api/weather/alerts
pub async fn alerts_by_body(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CoordinatesBody>, JsonRejection>,
) -> Result<Json<WeatherAlertsReport>, ApiError> {
    let Json(body) = payload?;
    let at = coordinates_from_json(body.lat.as_ref(), body.lon.as_ref())?;
    Ok(Json(state.shared.weather_service.alerts(at).await?))
}

/// GET /api/weather/advisory?lat&lon
pub async fn advisory(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<AdvisoryReport>, ApiError> {
    let at = coordinates_from_query(query.lat.as_deref(), query.lon.as_deref())?;
    Ok(Json(state.shared.weather_service.advisory(at).await?))
}
