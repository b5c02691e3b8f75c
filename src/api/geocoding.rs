use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::Response,
};
use std::sync::Arc;

use super::validation::coordinates_from_json;
use super::weather::payload_response;
use super::{ApiError, AppState, CoordinatesBody};

/// POST /api/geocoding
pub async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CoordinatesBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let at = coordinates_from_json(body.lat.as_ref(), body.lon.as_ref())?;
    let payload = state.shared.weather_service.geocode(at).await?;
    Ok(payload_response(payload))
}
