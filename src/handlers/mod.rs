pub mod auth;
pub mod dashboard;
pub mod health;
pub mod plans;
pub mod usage;
pub mod workout_types;
pub mod workouts;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::{AppError, Result};

/// Unwraps a JSON body, turning extractor rejections into a 400 with our error shape.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}
