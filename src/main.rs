use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fittrack::ai::{CompletionClient, CompletionOptions, OpenAiClient};
use fittrack::config::Config;
use fittrack::db;
use fittrack::handlers::{auth, dashboard, plans, usage, workout_types, workouts};
use fittrack::middleware::AuthContext;
use fittrack::migrations::run_migrations;
use fittrack::repositories::{
    PlanRepository, SessionRepository, UsageRepository, UserRepository, WorkoutRepository,
    WorkoutTypeRepository,
};
use fittrack::routes::{self, AppStates};
use fittrack::version::GIT_VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fittrack=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting fittrack {}", GIT_VERSION);
    tracing::info!("Connecting to database: {}", config.database_url);

    // Create database pool
    let pool = db::create_pool(&config.database_url)?;

    // Run migrations
    run_migrations(&pool)?;

    // Create repositories
    let user_repo = UserRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let workout_repo = WorkoutRepository::new(pool.clone());
    let workout_type_repo = WorkoutTypeRepository::new(pool.clone());
    let plan_repo = PlanRepository::new(pool.clone());
    let usage_repo = UsageRepository::new(pool.clone());

    let expired = session_repo.cleanup_expired().await?;
    if expired > 0 {
        tracing::info!("Removed {} expired sessions", expired);
    }

    // Completion client
    let completion: Option<Arc<dyn CompletionClient>> = match OpenAiClient::from_config(&config.openai)? {
        Some(client) => {
            tracing::info!("AI plan generation enabled with model {}", config.openai.model);
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, AI plan generation is disabled");
            None
        }
    };

    // Create handler states
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
        dashboard: dashboard::DashboardState {
            workout_repo: workout_repo.clone(),
        },
        plans: plans::PlansState {
            plan_repo,
            usage_repo: usage_repo.clone(),
            workout_type_repo,
            completion,
            quota: config.quota,
            options: CompletionOptions::plan_generation(),
        },
        usage: usage::UsageState { usage_repo },
    };
    let auth_context = AuthContext {
        user_repo,
        session_repo,
    };

    // Build router
    let app = routes::create_router(states, auth_context);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
