use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::Serialize;
use serde_json::Value;

use super::from_row::json_column;
use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub week_start: NaiveDate,
    pub is_active: bool,
    pub ai_generated: bool,
    pub ai_prompt_data: Option<Value>,
    pub ai_model_version: Option<String>,
    pub ai_generation_cost: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Plan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            week_start: row.get("week_start")?,
            is_active: row.get("is_active")?,
            ai_generated: row.get("ai_generated")?,
            ai_prompt_data: json_column(row, "ai_prompt_data")?,
            ai_model_version: row.get("ai_model_version")?,
            ai_generation_cost: row.get("ai_generation_cost")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDay {
    pub id: i64,
    pub plan_id: i64,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: i64,
    pub workout_type_id: i64,
    pub target_duration: Option<i64>,
    pub target_calories: Option<i64>,
    pub description: Option<String>,
    pub ai_exercise_data: Option<Value>,
    pub is_completed: bool,
}

impl FromSqliteRow for PlanDay {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            day_of_week: row.get("day_of_week")?,
            workout_type_id: row.get("workout_type_id")?,
            target_duration: row.get("target_duration")?,
            target_calories: row.get("target_calories")?,
            description: row.get("description")?,
            ai_exercise_data: json_column(row, "ai_exercise_data")?,
            is_completed: row.get("is_completed")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanWithDays {
    #[serde(flatten)]
    pub plan: Plan,
    pub plan_days: Vec<PlanDay>,
}

/// Insert payload for a plan; days are written alongside it.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub week_start: NaiveDate,
    pub ai_generated: bool,
    pub ai_prompt_data: Option<Value>,
    pub ai_model_version: Option<String>,
    pub ai_generation_cost: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewPlanDay {
    pub day_of_week: i64,
    pub workout_type_id: i64,
    pub target_duration: Option<i64>,
    pub target_calories: Option<i64>,
    pub description: Option<String>,
    pub ai_exercise_data: Option<Value>,
}
