use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::WorkoutType;
use crate::repositories::WorkoutTypeRepository;

#[derive(Clone)]
pub struct WorkoutTypesState {
    pub workout_type_repo: WorkoutTypeRepository,
}

pub async fn list(State(state): State<WorkoutTypesState>) -> Result<Json<Vec<WorkoutType>>> {
    Ok(Json(state.workout_type_repo.find_all().await?))
}
