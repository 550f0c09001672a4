use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::WorkoutWithType;
use crate::repositories::workout_repo::{TrendPoint, WorkoutTotals};
use crate::repositories::WorkoutRepository;

const RECENT_WORKOUTS: i64 = 5;
const DEFAULT_TREND_DAYS: i64 = 30;
const MIN_TREND_DAYS: i64 = 7;
const MAX_TREND_DAYS: i64 = 90;

#[derive(Clone)]
pub struct DashboardState {
    pub workout_repo: WorkoutRepository,
}

#[derive(Serialize)]
pub struct DashboardStats {
    this_week: WorkoutTotals,
    this_month: WorkoutTotals,
    recent_workouts: Vec<WorkoutWithType>,
}

#[derive(Deserialize)]
pub struct TrendQuery {
    days: Option<i64>,
}

#[derive(Serialize)]
pub struct Trend {
    days: i64,
    points: Vec<TrendPoint>,
}

/// First day of a window of `days` days ending today.
fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days - 1)
}

pub async fn index(
    State(state): State<DashboardState>,
    auth_user: AuthUser,
) -> Result<Json<DashboardStats>> {
    let today = Utc::now().date_naive();

    let this_week = state
        .workout_repo
        .totals_since(&auth_user.id, window_start(today, 7))
        .await?;
    let this_month = state
        .workout_repo
        .totals_since(&auth_user.id, window_start(today, 30))
        .await?;
    let recent_workouts = state
        .workout_repo
        .find_by_user_paginated(&auth_user.id, RECENT_WORKOUTS, 0)
        .await?;

    Ok(Json(DashboardStats {
        this_week,
        this_month,
        recent_workouts,
    }))
}

pub async fn trend(
    State(state): State<DashboardState>,
    auth_user: AuthUser,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Trend>> {
    let days = query
        .days
        .unwrap_or(DEFAULT_TREND_DAYS)
        .clamp(MIN_TREND_DAYS, MAX_TREND_DAYS);
    let today = Utc::now().date_naive();

    let points = state
        .workout_repo
        .trend(&auth_user.id, window_start(today, days), today)
        .await?;

    Ok(Json(Trend { days, points }))
}
