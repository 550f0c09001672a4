use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

/// Workout type that must report calories burned.
pub const CARDIO: &str = "Cardio";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutType {
    pub id: i64,
    pub name: String,
    pub color: String,
}

impl WorkoutType {
    pub fn requires_calories(&self) -> bool {
        self.name.eq_ignore_ascii_case(CARDIO)
    }
}

impl FromSqliteRow for WorkoutType {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            color: row.get("color")?,
        })
    }
}
