use rusqlite::OptionalExtension;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, WorkoutType};

#[derive(Clone)]
pub struct WorkoutTypeRepository {
    pool: DbPool,
}

impl WorkoutTypeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<WorkoutType>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workout_types ORDER BY name ASC")?;
            let types = stmt
                .query_map([], WorkoutType::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(types)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<WorkoutType>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workout_types WHERE id = ?")?;
            let result = stmt.query_row([id], WorkoutType::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Id of the first workout type, used as the default for generated plan days.
    pub async fn first_id(&self) -> Result<Option<i64>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let id = conn
                .query_row(
                    "SELECT id FROM workout_types ORDER BY id ASC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
