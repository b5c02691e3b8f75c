use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::{ApiError, AppState, ChatRequest, ChatResponse};
use crate::services::{Language, Topic, detect_language};

/// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;

    let language = match request.language.as_deref().map(str::trim) {
        None | Some("" | "auto") => detect_language(&request.message),
        Some(code) => code.parse::<Language>().map_err(ApiError::validation)?,
    };

    let topic = Topic::from_text(request.topic.as_deref().unwrap_or(&request.message));

    let catalog = &state.shared.catalog;
    let reply = catalog
        .reply(language, topic)
        .ok_or_else(|| ApiError::internal(format!("No reply for {topic:?} in {language}")))?
        .to_string();

    Ok(Json(ChatResponse {
        language,
        topic,
        reply,
    }))
}
