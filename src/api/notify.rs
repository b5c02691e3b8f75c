use axum::{
    Form, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::{AlertReceipt, AlertRequest};

/// POST /api/alerts/send
pub async fn send_alert(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AlertRequest>, JsonRejection>,
) -> Result<Json<AlertReceipt>, ApiError> {
    let Json(request) = payload?;
    let receipt = state
        .shared
        .notification_service
        .send_alert(&request)
        .await?;
    Ok(Json(receipt))
}

/// Delivery report posted by Twilio for high-priority messages.
#[derive(Debug, Deserialize)]
pub struct DeliveryStatus {
    #[serde(rename = "MessageSid", default)]
    pub message_sid: String,
    #[serde(rename = "MessageStatus", default)]
    pub message_status: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: Option<String>,
}

/// POST /api/alerts/status
pub async fn delivery_status(Form(status): Form<DeliveryStatus>) -> StatusCode {
    tracing::info!(
        message_id = %status.message_sid,
        status = %status.message_status,
        error_code = status.error_code.as_deref().unwrap_or(""),
        "Alert delivery status"
    );
    StatusCode::NO_CONTENT
}
