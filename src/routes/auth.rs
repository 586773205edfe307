//! Shared-secret authorization.
//!
//! The `Authorization` header must equal the configured token exactly. No
//! scheme prefix is stripped and no hashing is applied.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::ApiError;

// ---

pub(super) async fn require_token(
    State((_, config)): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // ---
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if presented != Some(config.api_token.as_str()) {
        tracing::warn!(
            "Rejected {} {}: missing or mismatched Authorization header",
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
