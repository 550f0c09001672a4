use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::FromSqliteRow;
use crate::validation::invalid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: String,
    pub workout_type_id: i64,
    pub duration_min: i32,
    pub calories: Option<i32>,
    pub performed_at: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            workout_type_id: row.get("workout_type_id")?,
            duration_min: row.get("duration_min")?,
            calories: row.get("calories")?,
            performed_at: row.get("performed_at")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A workout joined with its type's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutWithType {
    #[serde(flatten)]
    pub workout: Workout,
    pub workout_type_name: String,
    pub workout_type_color: String,
}

impl FromSqliteRow for WorkoutWithType {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            workout: Workout::from_row(row)?,
            workout_type_name: row.get("workout_type_name")?,
            workout_type_color: row.get("workout_type_color")?,
        })
    }
}

/// Create/update payload for a workout.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkoutForm {
    #[validate(range(min = 1, message = "Please select a workout type"))]
    pub workout_type_id: i64,
    #[validate(range(min = 1, max = 600, message = "Duration must be between 1 and 600 minutes"))]
    pub duration_min: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 5000, message = "Calories must be between 0 and 5000"))]
    pub calories: Option<i32>,
    #[validate(custom(function = "not_in_future"))]
    pub performed_at: NaiveDate,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

impl WorkoutForm {
    /// Blank notes are stored as NULL.
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }
}

fn not_in_future(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date > Utc::now().date_naive() {
        return Err(invalid("future_date", "Cannot log future workouts"));
    }
    Ok(())
}
