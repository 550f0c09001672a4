//! AI workout-plan pipeline.
//!
//! quota gate -> prompt builder -> completion call with retry -> response
//! normalizer -> persistence (done by the plan handler).

pub mod client;
pub mod cost;
pub mod normalize;
pub mod openai;
pub mod prompt;
pub mod quota;
pub mod retry;
pub mod schema;

pub use client::{
    ChatMessage, ChatRole, Completion, CompletionClient, CompletionError, CompletionOptions,
    TokenUsage,
};
pub use normalize::{normalize_plan_response, NormalizeError};
pub use openai::OpenAiClient;
pub use prompt::{build_plan_messages, PlanRequest};
pub use quota::{QuotaDecision, QuotaLimits, QuotaUsage};
pub use retry::complete_with_retry;
pub use schema::WorkoutPlan;
