use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::json_body;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{WorkoutForm, WorkoutType, WorkoutWithType};
use crate::repositories::{WorkoutRepository, WorkoutTypeRepository};
use crate::validation::FieldErrors;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
    pub workout_type_repo: WorkoutTypeRepository,
}

// Query params
#[derive(Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Serialize)]
pub struct Pagination {
    page: i64,
    limit: i64,
    total: i64,
    total_pages: i64,
    has_next: bool,
}

#[derive(Serialize)]
pub struct WorkoutList {
    workouts: Vec<WorkoutWithType>,
    pagination: Pagination,
}

fn not_found() -> AppError {
    AppError::NotFound("Workout not found or access denied".to_string())
}

/// Field checks, then the type lookup, then type-specific rules.
async fn validate_form(state: &WorkoutsState, form: &WorkoutForm) -> Result<WorkoutType> {
    form.validate().map_err(|e| AppError::Validation(e.into()))?;

    let workout_type = state
        .workout_type_repo
        .find_by_id(form.workout_type_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid workout type selected".to_string()))?;

    if workout_type.requires_calories() && form.calories.is_none() {
        let mut errors = FieldErrors::new();
        errors.add("calories", "Cardio workouts should include calories burned");
        return Err(AppError::Validation(errors));
    }

    Ok(workout_type)
}

// Handlers
pub async fn list(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<WorkoutList>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let workouts = state
        .workout_repo
        .find_by_user_paginated(&auth_user.id, limit, offset)
        .await?;
    let total = state.workout_repo.count_by_user(&auth_user.id).await?;
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(WorkoutList {
        workouts,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
        },
    }))
}

pub async fn create(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    payload: std::result::Result<Json<WorkoutForm>, JsonRejection>,
) -> Result<Response> {
    let form = json_body(payload)?;
    let workout_type = validate_form(&state, &form).await?;

    let workout = state.workout_repo.create(&auth_user.id, &form).await?;
    tracing::info!(
        workout_id = workout.workout.id,
        user_id = %auth_user.id,
        "Logged workout"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("{} workout logged successfully!", workout_type.name),
            "data": workout,
        })),
    )
        .into_response())
}

pub async fn show(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<WorkoutWithType>> {
    let workout = state
        .workout_repo
        .find_for_user(id, &auth_user.id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(workout))
}

pub async fn update(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<WorkoutForm>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    let form = json_body(payload)?;
    validate_form(&state, &form).await?;

    let workout = state
        .workout_repo
        .update(id, &auth_user.id, &form)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(json!({
        "success": true,
        "message": "Workout updated successfully!",
        "data": workout,
    })))
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    if !state.workout_repo.delete(id, &auth_user.id).await? {
        return Err(not_found());
    }

    Ok(Json(json!({
        "success": true,
        "message": "Workout deleted successfully!",
    })))
}
