use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use serde::Serialize;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, WorkoutForm, WorkoutWithType};

const SELECT_WITH_TYPE: &str = "SELECT w.*, wt.name AS workout_type_name, wt.color AS workout_type_color
     FROM workouts w
     JOIN workout_types wt ON w.workout_type_id = wt.id";

/// Totals over a date window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkoutTotals {
    pub workouts: i64,
    pub minutes: i64,
    pub calories: i64,
}

/// One day of the activity trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub workouts: i64,
    pub minutes: i64,
    pub calories: i64,
}

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str, form: &WorkoutForm) -> Result<WorkoutWithType> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let form = form.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO workouts
                    (user_id, workout_type_id, duration_min, calories, performed_at, notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    user_id,
                    form.workout_type_id,
                    form.duration_min,
                    form.calories,
                    form.performed_at,
                    form.notes(),
                    now,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid();

            let mut stmt = conn.prepare(&format!("{SELECT_WITH_TYPE} WHERE w.id = ?"))?;
            let workout = stmt.query_row([id], WorkoutWithType::from_row)?;
            Ok(workout)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Looks a workout up by id, scoped to its owner.
    pub async fn find_for_user(&self, id: i64, user_id: &str) -> Result<Option<WorkoutWithType>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare(&format!("{SELECT_WITH_TYPE} WHERE w.id = ? AND w.user_id = ?"))?;
            let workout = stmt
                .query_row(rusqlite::params![id, user_id], WorkoutWithType::from_row)
                .optional()?;
            Ok(workout)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_user_paginated(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkoutWithType>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(&format!(
                "{SELECT_WITH_TYPE} WHERE w.user_id = ?
                 ORDER BY w.performed_at DESC, w.id DESC
                 LIMIT ? OFFSET ?"
            ))?;
            let workouts = stmt
                .query_map(
                    rusqlite::params![user_id, limit, offset],
                    WorkoutWithType::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn count_by_user(&self, user_id: &str) -> Result<i64> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM workouts WHERE user_id = ?",
                [&user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Returns the updated workout, or `None` when it is missing or owned by someone else.
    pub async fn update(
        &self,
        id: i64,
        user_id: &str,
        form: &WorkoutForm,
    ) -> Result<Option<WorkoutWithType>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let form = form.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workouts
                 SET workout_type_id = ?, duration_min = ?, calories = ?, performed_at = ?,
                     notes = ?, updated_at = ?
                 WHERE id = ? AND user_id = ?",
                rusqlite::params![
                    form.workout_type_id,
                    form.duration_min,
                    form.calories,
                    form.performed_at,
                    form.notes(),
                    now,
                    id,
                    user_id
                ],
            )?;
            if rows == 0 {
                return Ok(None);
            }

            let mut stmt = conn.prepare(&format!("{SELECT_WITH_TYPE} WHERE w.id = ?"))?;
            let workout = stmt.query_row([id], WorkoutWithType::from_row)?;
            Ok(Some(workout))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete(&self, id: i64, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workouts WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    // Statistics
    pub async fn totals_since(&self, user_id: &str, since: NaiveDate) -> Result<WorkoutTotals> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let totals = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration_min), 0), COALESCE(SUM(calories), 0)
                 FROM workouts
                 WHERE user_id = ? AND performed_at >= ?",
                rusqlite::params![user_id, since],
                |row| {
                    Ok(WorkoutTotals {
                        workouts: row.get(0)?,
                        minutes: row.get(1)?,
                        calories: row.get(2)?,
                    })
                },
            )?;
            Ok(totals)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Per-day totals from `since` through `until`, including days without workouts.
    pub async fn trend(
        &self,
        user_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<TrendPoint>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        let rows = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT performed_at, COUNT(*), COALESCE(SUM(duration_min), 0), COALESCE(SUM(calories), 0)
                 FROM workouts
                 WHERE user_id = ? AND performed_at >= ? AND performed_at <= ?
                 GROUP BY performed_at
                 ORDER BY performed_at",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, since, until], |row| {
                    Ok(TrendPoint {
                        date: row.get(0)?,
                        workouts: row.get(1)?,
                        minutes: row.get(2)?,
                        calories: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok::<_, AppError>(rows)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(fill_trend(rows, since, until))
    }
}

fn fill_trend(rows: Vec<TrendPoint>, since: NaiveDate, until: NaiveDate) -> Vec<TrendPoint> {
    let mut rows = rows.into_iter().peekable();
    since
        .iter_days()
        .take_while(|date| *date <= until)
        .map(|date| match rows.next_if(|point| point.date == date) {
            Some(point) => point,
            None => TrendPoint {
                date,
                workouts: 0,
                minutes: 0,
                calories: 0,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_fill_trend_inserts_empty_days() {
        let rows = vec![TrendPoint {
            date: date("2024-03-02"),
            workouts: 2,
            minutes: 90,
            calories: 400,
        }];

        let trend = fill_trend(rows, date("2024-03-01"), date("2024-03-03"));

        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].workouts, 0);
        assert_eq!(trend[1].minutes, 90);
        assert_eq!(trend[2].date, date("2024-03-03"));
    }
}
