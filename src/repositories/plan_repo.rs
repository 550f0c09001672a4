use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, NewPlan, NewPlanDay, Plan, PlanDay, PlanWithDays};

#[derive(Clone)]
pub struct PlanRepository {
    pool: DbPool,
}

impl PlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts a plan and all of its days in one transaction.
    pub async fn create_with_days(
        &self,
        plan: NewPlan,
        days: Vec<NewPlanDay>,
    ) -> Result<PlanWithDays> {
        let pool = self.pool.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO plans
                    (user_id, title, description, week_start, is_active, ai_generated,
                     ai_prompt_data, ai_model_version, ai_generation_cost, created_at)
                 VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    plan.user_id,
                    plan.title,
                    plan.description,
                    plan.week_start,
                    plan.ai_generated,
                    plan.ai_prompt_data.as_ref().map(|v| v.to_string()),
                    plan.ai_model_version,
                    plan.ai_generation_cost,
                    now
                ],
            )?;
            let plan_id = tx.last_insert_rowid();

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO plan_days
                        (plan_id, day_of_week, workout_type_id, target_duration, target_calories,
                         description, ai_exercise_data, is_completed)
                     VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
                )?;
                for day in &days {
                    stmt.execute(rusqlite::params![
                        plan_id,
                        day.day_of_week,
                        day.workout_type_id,
                        day.target_duration,
                        day.target_calories,
                        day.description,
                        day.ai_exercise_data.as_ref().map(|v| v.to_string()),
                    ])?;
                }
            }

            let created = load_plan(&tx, plan_id)?
                .ok_or_else(|| AppError::Internal("created plan vanished".to_string()))?;
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Active AI-generated plans, newest first.
    pub async fn find_active_ai_plans(&self, user_id: &str) -> Result<Vec<PlanWithDays>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM plans
                 WHERE user_id = ? AND is_active = 1 AND ai_generated = 1
                 ORDER BY created_at DESC, id DESC",
            )?;
            let plans = stmt
                .query_map([&user_id], Plan::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut result = Vec::with_capacity(plans.len());
            for plan in plans {
                let plan_days = load_days(&conn, plan.id)?;
                result.push(PlanWithDays { plan, plan_days });
            }
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_for_user(&self, id: i64, user_id: &str) -> Result<Option<PlanWithDays>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let plan = load_plan(&conn, id)?.filter(|p| p.plan.user_id == user_id);
            Ok(plan)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn load_plan(conn: &Connection, id: i64) -> Result<Option<PlanWithDays>> {
    let plan = conn
        .query_row("SELECT * FROM plans WHERE id = ?", [id], Plan::from_row)
        .optional()?;

    match plan {
        Some(plan) => {
            let plan_days = load_days(conn, plan.id)?;
            Ok(Some(PlanWithDays { plan, plan_days }))
        }
        None => Ok(None),
    }
}

fn load_days(conn: &Connection, plan_id: i64) -> Result<Vec<PlanDay>> {
    let mut stmt =
        conn.prepare("SELECT * FROM plan_days WHERE plan_id = ? ORDER BY day_of_week ASC, id ASC")?;
    let days = stmt
        .query_map([plan_id], PlanDay::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(days)
}
