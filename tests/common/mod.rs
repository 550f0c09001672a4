#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;

use fittrack::ai::{
    ChatMessage, Completion, CompletionClient, CompletionError, CompletionOptions, QuotaLimits,
    TokenUsage,
};
use fittrack::db::{create_memory_pool, DbPool};
use fittrack::handlers::{auth, dashboard, plans, usage, workout_types, workouts};
use fittrack::middleware::AuthContext;
use fittrack::migrations::run_migrations_for_tests;
use fittrack::models::User;
use fittrack::repositories::{
    PlanRepository, SessionRepository, UsageRepository, UserRepository, WorkoutRepository,
    WorkoutTypeRepository,
};
use fittrack::routes::{create_router, AppStates};

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub fn create_test_app(pool: DbPool) -> Router {
    create_test_app_with_completion(pool, None)
}

pub fn create_test_app_with_completion(
    pool: DbPool,
    completion: Option<Arc<dyn CompletionClient>>,
) -> Router {
    let user_repo = UserRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let workout_repo = WorkoutRepository::new(pool.clone());
    let workout_type_repo = WorkoutTypeRepository::new(pool.clone());
    let usage_repo = UsageRepository::new(pool.clone());

    let states = AppStates {
        auth: auth::AuthState {
            user_repo: user_repo.clone(),
            session_repo: session_repo.clone(),
        },
        workout_types: workout_types::WorkoutTypesState {
            workout_type_repo: workout_type_repo.clone(),
        },
        workouts: workouts::WorkoutsState {
            workout_repo: workout_repo.clone(),
            workout_type_repo: workout_type_repo.clone(),
        },
        dashboard: dashboard::DashboardState { workout_repo },
        plans: plans::PlansState {
            plan_repo: PlanRepository::new(pool.clone()),
            usage_repo: usage_repo.clone(),
            workout_type_repo,
            completion,
            quota: QuotaLimits::default(),
            // One attempt keeps failure tests free of backoff sleeps.
            options: CompletionOptions {
                retries: 1,
                ..CompletionOptions::plan_generation()
            },
        },
        usage: usage::UsageState { usage_repo },
    };

    create_router(
        states,
        AuthContext {
            user_repo,
            session_repo,
        },
    )
}

pub fn create_test_app_with_fake(pool: DbPool, client: &Arc<FakeCompletionClient>) -> Router {
    let client: Arc<dyn CompletionClient> = client.clone();
    create_test_app_with_completion(pool, Some(client))
}

pub async fn create_test_user(pool: &DbPool, email: &str, password: &str) -> User {
    let user_repo = UserRepository::new(pool.clone());
    let name = email.split('@').next().unwrap_or(email);
    user_repo.create(email, name, password).await.unwrap()
}

pub async fn create_session_cookie(pool: &DbPool, user: &User) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    let token = session_repo.create(&user.id).await.unwrap();
    format!("session={}", token)
}

/// A user plus a cookie header value for their session.
pub async fn login_test_user(pool: &DbPool, email: &str) -> (User, String) {
    let user = create_test_user(pool, email, "password123").await;
    let cookie = create_session_cookie(pool, &user).await;
    (user, cookie)
}

pub fn extract_cookie_header(set_cookie: &str) -> String {
    // Extract just the cookie name=value part for use in Cookie header
    set_cookie.split(';').next().unwrap_or("").to_string()
}

pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn valid_plan_request() -> serde_json::Value {
    serde_json::json!({
        "fitness_level": "beginner",
        "primary_goal": "general_fitness",
        "available_days": 3,
        "session_duration": 45,
        "equipment": ["dumbbells"],
    })
}

pub fn sample_plan_json() -> serde_json::Value {
    serde_json::json!({
        "title": "Starter Plan",
        "description": "Two weeks to build a habit",
        "duration_weeks": 2,
        "workouts_per_week": 2,
        "difficulty_level": "beginner",
        "weeks": [
            {
                "week_number": 1,
                "focus": "Foundation",
                "workouts": [
                    {
                        "day": "monday",
                        "workout_type": "Full Body",
                        "duration_minutes": 40,
                        "estimated_calories": 250,
                        "description": "Full body basics",
                        "exercises": [
                            { "name": "Goblet Squat", "sets": 3, "reps": "10" },
                            { "name": "Push-up", "sets": 3, "reps": "8-12" }
                        ]
                    },
                    {
                        "day": "sunday",
                        "workout_type": "Mobility",
                        "exercises": [ { "name": "Hip Flexor Stretch" } ]
                    }
                ]
            },
            {
                "week_number": 2,
                "workouts": [
                    {
                        "day": "wednesday",
                        "duration_minutes": 45,
                        "exercises": [ { "name": "Dumbbell Row", "sets": 4, "reps": "10" } ]
                    }
                ]
            }
        ]
    })
}

pub fn completion(content: &str) -> Completion {
    Completion {
        content: Some(content.to_string()),
        finish_reason: Some("stop".to_string()),
        model: "gpt-4o-mini".to_string(),
        usage: TokenUsage {
            prompt_tokens: 1000,
            completion_tokens: 2000,
            total_tokens: 3000,
        },
    }
}

/// Completion client replaying scripted outcomes.
pub struct FakeCompletionClient {
    outcomes: Mutex<VecDeque<Result<Completion, CompletionError>>>,
    calls: AtomicU32,
}

impl FakeCompletionClient {
    pub fn new(outcomes: Vec<Result<Completion, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn replying(content: &str) -> Arc<Self> {
        Self::new(vec![Ok(completion(content))])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for FakeCompletionClient {
    fn model(&self) -> &str {
        "gpt-4o-mini"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<Completion, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CompletionError::Transport("no scripted outcome".to_string())))
    }
}
