use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

use super::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Guards the trigger endpoints with the shared `api.key`.
///
/// With no key configured every caller is let through, which is only meant
/// for local development.
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.settings.api.key.as_deref() {
        check_api_key(req.headers(), expected)?;
    }

    Ok(next.run(req).await)
}

fn check_api_key(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    match headers.get(API_KEY_HEADER).map(|v| v.to_str()) {
        Some(Ok(key)) if key == expected => Ok(()),
        Some(_) => Err(AppError::Auth("Invalid API key".to_string())),
        None => Err(AppError::Auth(format!("Missing {} header", API_KEY_HEADER))),
    }
}
