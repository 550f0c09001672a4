pub mod plan_repo;
pub mod session_repo;
pub mod usage_repo;
pub mod user_repo;
pub mod workout_repo;
pub mod workout_type_repo;

pub use plan_repo::PlanRepository;
pub use session_repo::SessionRepository;
pub use usage_repo::UsageRepository;
pub use user_repo::UserRepository;
pub use workout_repo::WorkoutRepository;
pub use workout_type_repo::WorkoutTypeRepository;
