//! Request-level error taxonomy and its JSON envelope.
//!
//! Every failure is converted to a response at the router boundary; handlers
//! just return `Result<_, ApiError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid device id: {0}")]
    InvalidDevice(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(#[from] sqlx::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ApiError {
    // ---
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MissingFields | ApiError::InvalidBody(_) | ApiError::InvalidDevice(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        // ---
        match self {
            ApiError::Unauthorized => ErrorBody {
                error: "Unauthorized",
                message: None,
            },
            ApiError::MissingFields => ErrorBody {
                error: "Missing required fields",
                message: None,
            },
            ApiError::InvalidBody(detail) => ErrorBody {
                error: "Invalid request body",
                message: Some(detail.clone()),
            },
            ApiError::InvalidDevice(detail) => ErrorBody {
                error: "Invalid device id",
                message: Some(detail.clone()),
            },
            ApiError::NotFound => ErrorBody {
                error: "Not found",
                message: None,
            },
            // Trusted-device integration: the storage failure is surfaced as-is.
            ApiError::Internal(e) => ErrorBody {
                error: "Internal server error",
                message: Some(e.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        if let ApiError::Internal(e) = &self {
            tracing::error!("Request failed: {}", e);
        }
        (self.status(), Json(self.body())).into_response()
    }
}
