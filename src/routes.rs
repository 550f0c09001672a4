use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::handlers::{auth, dashboard, health, plans, usage, workout_types, workouts};
use crate::middleware::AuthContext;

pub struct AppStates {
    pub auth: auth::AuthState,
    pub workout_types: workout_types::WorkoutTypesState,
    pub workouts: workouts::WorkoutsState,
    pub dashboard: dashboard::DashboardState,
    pub plans: plans::PlansState,
    pub usage: usage::UsageState,
}

pub fn create_router(states: AppStates, auth_context: AuthContext) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .with_state(states.auth)
        .route("/api/workout-types", get(workout_types::list))
        .with_state(states.workout_types)
        // Workout routes
        .route("/api/workouts", get(workouts::list).post(workouts::create))
        .route(
            "/api/workouts/{id}",
            get(workouts::show)
                .put(workouts::update)
                .delete(workouts::delete),
        )
        .with_state(states.workouts)
        // Dashboard
        .route("/api/dashboard", get(dashboard::index))
        .route("/api/dashboard/trend", get(dashboard::trend))
        .with_state(states.dashboard)
        // AI plans
        .route("/api/ai/plan", get(plans::list).post(plans::generate))
        .route("/api/plans/{id}", get(plans::show))
        .with_state(states.plans)
        .route("/api/ai/usage", get(usage::summary))
        .with_state(states.usage)
        // Session lookup for the AuthUser extractor
        .layer(Extension(auth_context))
}
