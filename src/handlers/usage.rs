use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{UsageBreakdown, UsageLog};
use crate::repositories::UsageRepository;

const DEFAULT_DAYS: i64 = 30;
const MAX_DAYS: i64 = 365;

#[derive(Clone)]
pub struct UsageState {
    pub usage_repo: UsageRepository,
}

#[derive(Deserialize)]
pub struct UsageQuery {
    days: Option<i64>,
}

#[derive(Serialize)]
pub struct UsageReport {
    days: i64,
    request_count: i64,
    successful_requests: i64,
    total_tokens: i64,
    total_cost: f64,
    success_rate: f64,
    #[serde(flatten)]
    breakdown: UsageBreakdown,
    logs: Vec<UsageLog>,
}

pub async fn summary(
    State(state): State<UsageState>,
    auth_user: AuthUser,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageReport>> {
    let days = query.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
    let since = Utc::now() - Duration::days(days);

    let summary = state.usage_repo.summary_since(&auth_user.id, since).await?;
    let logs = state.usage_repo.find_since(&auth_user.id, since).await?;

    Ok(Json(UsageReport {
        days,
        request_count: summary.request_count,
        successful_requests: summary.successful_requests,
        total_tokens: summary.total_tokens,
        total_cost: summary.total_cost,
        success_rate: summary.success_rate(),
        breakdown: UsageBreakdown::from_logs(&logs),
        logs,
    }))
}
