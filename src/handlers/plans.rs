use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use validator::Validate;

use super::json_body;
use crate::ai::cost::estimate_cost;
use crate::ai::schema::day_of_week;
use crate::ai::{
    build_plan_messages, complete_with_retry, normalize_plan_response, Completion,
    CompletionClient, CompletionError, CompletionOptions, PlanRequest, QuotaLimits, TokenUsage,
    WorkoutPlan,
};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{NewPlan, NewPlanDay, NewUsageLog, PlanWithDays, RequestType};
use crate::repositories::{PlanRepository, UsageRepository, WorkoutTypeRepository};

/// Used for plan days when no workout types exist.
const FALLBACK_WORKOUT_TYPE_ID: i64 = 1;

#[derive(Clone)]
pub struct PlansState {
    pub plan_repo: PlanRepository,
    pub usage_repo: UsageRepository,
    pub workout_type_repo: WorkoutTypeRepository,
    /// `None` when no API key is configured.
    pub completion: Option<Arc<dyn CompletionClient>>,
    pub quota: QuotaLimits,
    pub options: CompletionOptions,
}

impl PlansState {
    /// Usage logging never fails the request it describes.
    async fn record_usage(&self, log: NewUsageLog) {
        if let Err(e) = self.usage_repo.record(log).await {
            warn!("Failed to record AI usage: {}", e);
        }
    }

    async fn record_failure(
        &self,
        user_id: &str,
        model: &str,
        usage: TokenUsage,
        message: String,
        started: Instant,
    ) {
        self.record_usage(usage_log(user_id, model, usage, false, Some(message), started))
            .await;
    }
}

fn usage_log(
    user_id: &str,
    model: &str,
    usage: TokenUsage,
    success: bool,
    error_message: Option<String>,
    started: Instant,
) -> NewUsageLog {
    NewUsageLog {
        user_id: user_id.to_string(),
        request_type: RequestType::PlanGeneration,
        prompt_tokens: usage.prompt_tokens.into(),
        completion_tokens: usage.completion_tokens.into(),
        total_tokens: usage.total_tokens.into(),
        cost: estimate_cost(usage.prompt_tokens, usage.completion_tokens),
        model: model.to_string(),
        success,
        error_message,
        request_duration_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
    }
}

fn completion_failure(error: &CompletionError) -> AppError {
    if error.is_quota_exceeded() {
        AppError::UpstreamUnavailable
    } else if error.is_invalid_api_key() {
        AppError::UpstreamConfig
    } else {
        AppError::PlanGeneration(error.to_string())
    }
}

/// Non-empty, untruncated completion text.
fn completion_text(completion: &Completion) -> std::result::Result<&str, String> {
    if completion.is_truncated() {
        return Err("AI response was truncated before completion".to_string());
    }
    completion
        .content
        .as_deref()
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| "Empty response from AI".to_string())
}

/// One plan day per workout of every week.
fn plan_days(plan: &WorkoutPlan, workout_type_id: i64) -> Vec<NewPlanDay> {
    plan.weeks
        .iter()
        .flat_map(|week| {
            week.workouts.iter().filter_map(move |workout| {
                // Day names were validated during normalization.
                let day = day_of_week(&workout.day)?;
                Some(NewPlanDay {
                    day_of_week: day,
                    workout_type_id,
                    target_duration: workout.duration_minutes,
                    target_calories: workout.estimated_calories,
                    description: workout
                        .description
                        .clone()
                        .or_else(|| workout.workout_type.clone()),
                    ai_exercise_data: Some(json!({
                        "week": week.week_number,
                        "workout_type": workout.workout_type,
                        "exercises": workout.exercises,
                    })),
                })
            })
        })
        .collect()
}

pub async fn generate(
    State(state): State<PlansState>,
    auth_user: AuthUser,
    payload: std::result::Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let usage = state
        .usage_repo
        .quota_usage(&auth_user.id, Utc::now())
        .await?;
    let decision = state.quota.check(&usage);
    if !decision.can_proceed {
        let reason = decision
            .reason
            .unwrap_or_else(|| "Quota exceeded".to_string());
        warn!(user_id = %auth_user.id, reason = %reason, "AI quota denied");
        return Err(AppError::QuotaExceeded(reason));
    }

    let request = json_body(payload)?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;

    let client = state.completion.clone().ok_or_else(|| {
        error!("Plan generation requested but no completion API key is configured");
        AppError::UpstreamConfig
    })?;

    info!(
        user_id = %auth_user.id,
        goal = %request.primary_goal,
        level = %request.fitness_level,
        "Generating workout plan"
    );

    let messages = build_plan_messages(&request);
    let started = Instant::now();

    let completion = match complete_with_retry(client.as_ref(), &messages, &state.options).await {
        Ok(completion) => completion,
        Err(e) => {
            state
                .record_failure(
                    &auth_user.id,
                    client.model(),
                    TokenUsage::default(),
                    e.to_string(),
                    started,
                )
                .await;
            return Err(completion_failure(&e));
        }
    };

    let model = if completion.model.is_empty() {
        client.model().to_string()
    } else {
        completion.model.clone()
    };

    let plan = match completion_text(&completion)
        .and_then(|text| normalize_plan_response(text).map_err(|e| e.to_string()))
    {
        Ok(plan) => plan,
        Err(details) => {
            error!(user_id = %auth_user.id, "Failed to parse AI plan: {}", details);
            state
                .record_failure(
                    &auth_user.id,
                    &model,
                    completion.usage,
                    format!("Parse error: {details}"),
                    started,
                )
                .await;
            return Err(AppError::UpstreamFormat(details));
        }
    };

    let workout_type_id = state
        .workout_type_repo
        .first_id()
        .await?
        .unwrap_or(FALLBACK_WORKOUT_TYPE_ID);
    let cost = estimate_cost(
        completion.usage.prompt_tokens,
        completion.usage.completion_tokens,
    );

    let new_plan = NewPlan {
        user_id: auth_user.id.clone(),
        title: plan.title.clone(),
        description: plan.description.clone(),
        week_start: Utc::now().date_naive(),
        ai_generated: true,
        ai_prompt_data: serde_json::to_value(&request).ok(),
        ai_model_version: Some(model.clone()),
        ai_generation_cost: Some(cost),
    };

    let saved = match state
        .plan_repo
        .create_with_days(new_plan, plan_days(&plan, workout_type_id))
        .await
    {
        Ok(saved) => saved,
        Err(e) => {
            state
                .record_failure(
                    &auth_user.id,
                    &model,
                    completion.usage,
                    format!("Persistence error: {e}"),
                    started,
                )
                .await;
            return Err(e);
        }
    };

    state
        .record_usage(usage_log(
            &auth_user.id,
            &model,
            completion.usage,
            true,
            None,
            started,
        ))
        .await;

    info!(
        user_id = %auth_user.id,
        plan_id = saved.plan.id,
        days = saved.plan_days.len(),
        "Workout plan saved"
    );

    Ok(Json(json!({
        "success": true,
        "plan": {
            "id": saved.plan.id,
            "title": plan.title,
            "description": plan.description,
            "duration_weeks": plan.duration_weeks,
            "workouts_per_week": plan.workouts_per_week,
            "difficulty_level": plan.difficulty_level,
            "weeks": plan.weeks,
        },
        "metadata": {
            "generated_at": Utc::now().to_rfc3339(),
            "token_usage": completion.usage,
            "model": model,
        },
    })))
}

pub async fn list(
    State(state): State<PlansState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let plans = state.plan_repo.find_active_ai_plans(&auth_user.id).await?;
    Ok(Json(json!({ "success": true, "plans": plans })))
}

pub async fn show(
    State(state): State<PlansState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PlanWithDays>> {
    let plan = state
        .plan_repo
        .find_for_user(id, &auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

    Ok(Json(plan))
}
