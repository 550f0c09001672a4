use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::validation::FieldErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error")]
    Validation(FieldErrors),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Upstream returned an invalid response: {0}")]
    UpstreamFormat(String),

    #[error("Upstream service unavailable")]
    UpstreamUnavailable,

    #[error("Upstream service misconfigured")]
    UpstreamConfig,

    #[error("Plan generation failed: {0}")]
    PlanGeneration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Password hash error")]
    PasswordHash,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
                None,
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Please correct the errors below".to_string(),
                serde_json::to_value(errors).ok(),
            ),
            AppError::QuotaExceeded(reason) => (StatusCode::TOO_MANY_REQUESTS, reason, None),
            AppError::UpstreamFormat(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI generated invalid response format".to_string(),
                Some(serde_json::Value::String(details)),
            ),
            AppError::UpstreamUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AI service temporarily unavailable. Please try again later.".to_string(),
                None,
            ),
            AppError::UpstreamConfig => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI service configuration error".to_string(),
                None,
            ),
            AppError::PlanGeneration(cause) => {
                tracing::error!("AI plan generation error: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate workout plan. Please try again.".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                    None,
                )
            }
            AppError::PasswordHash => {
                tracing::error!("Password hash error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                details,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
