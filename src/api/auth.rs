use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::AuthError;

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that accepts:
/// 1. `Authorization: Bearer <token>` header
/// 2. `X-Api-Key` header
///
/// On success the resolved [`Principal`](crate::services::Principal) is
/// stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers).ok_or(AuthError::MissingCredentials)?;

    let principal = state.shared.auth_service.verify_token(&token).await?;
    tracing::Span::current().record("user_id", &principal.username);

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
    {
        let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
        && !key_str.trim().is_empty()
    {
        return Some(key_str.trim().to_string());
    }

    None
}
