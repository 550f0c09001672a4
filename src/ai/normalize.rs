//! Turns raw model output into a validated [`WorkoutPlan`].

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use validator::Validate;

use super::schema::{check_plan_types, WorkoutPlan};
use crate::validation::FieldErrors;

const FENCE: &str = "```";
/// Key some models wrap the whole plan in.
const WRAPPER_KEY: &str = "workout_plan";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Invalid JSON format: missing braces")]
    MissingBraces,

    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid AI response format: {}", .0.messages().join("; "))]
    Schema(FieldErrors),
}

/// Strips a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with(FENCE) {
        return text;
    }

    let body = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix(FENCE))
        .unwrap_or(text);
    let body = body.strip_suffix(FENCE).unwrap_or(body);
    body.trim()
}

/// Removes one level of `{"workout_plan": {...}}` wrapping when the top level has no title.
pub fn unwrap_plan(value: Value) -> Value {
    let has_title = value
        .get("title")
        .is_some_and(|title| !title.is_null() && title.as_str() != Some(""));

    match value {
        Value::Object(mut map) if !has_title => match map.remove(WRAPPER_KEY) {
            Some(inner) if !inner.is_null() => {
                debug!("Unwrapping {} object", WRAPPER_KEY);
                inner
            }
            Some(inner) => {
                map.insert(WRAPPER_KEY.to_string(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Type-checks, deserializes and validates a plan, reporting every violation by path.
pub fn validate_plan(mut value: Value) -> Result<WorkoutPlan, FieldErrors> {
    let type_errors = check_plan_types(&mut value);
    if !type_errors.is_empty() {
        return Err(type_errors);
    }

    let plan: WorkoutPlan = serde_json::from_value(value).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.add("", e.to_string());
        errors
    })?;

    plan.validate()?;
    Ok(plan)
}

/// Full normalization: fence stripping, brace check, parse, unwrap, validate.
pub fn normalize_plan_response(raw: &str) -> Result<WorkoutPlan, NormalizeError> {
    let cleaned = strip_code_fence(raw);

    if !cleaned.starts_with('{') || !cleaned.ends_with('}') {
        warn!("Completion output does not look like a JSON object");
        return Err(NormalizeError::MissingBraces);
    }

    let parsed: Value = serde_json::from_str(cleaned)?;

    validate_plan(unwrap_plan(parsed)).map_err(|errors| {
        warn!(violations = ?errors.messages(), "Plan failed schema validation");
        NormalizeError::Schema(errors)
    })
}
