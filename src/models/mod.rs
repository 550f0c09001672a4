pub mod from_row;
pub mod plan;
pub mod usage_log;
pub mod user;
pub mod workout;
pub mod workout_type;

pub use from_row::FromSqliteRow;
pub use plan::{NewPlan, NewPlanDay, Plan, PlanDay, PlanWithDays};
pub use usage_log::{NewUsageLog, RequestType, UsageBreakdown, UsageLog, UsageSummary};
pub use user::{LoginCredentials, RegisterUser, User};
pub use workout::{Workout, WorkoutForm, WorkoutWithType};
pub use workout_type::WorkoutType;
