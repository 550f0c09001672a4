//! Shape of a generated workout plan.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::validation::{one_of, FieldErrors};

/// Lowercase day names indexed by day of week, Sunday first.
pub const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

pub const DIFFICULTY_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Day of week for a lowercase day name, 0 = Sunday.
pub fn day_of_week(day: &str) -> Option<i64> {
    DAY_NAMES
        .iter()
        .position(|name| *name == day)
        .map(|index| index as i64)
}

fn validate_day(day: &str) -> Result<(), ValidationError> {
    one_of(
        day,
        &DAY_NAMES,
        "day",
        "Day must be a lowercase weekday name (monday..sunday)",
    )
}

fn validate_difficulty(level: &str) -> Result<(), ValidationError> {
    one_of(
        level,
        &DIFFICULTY_LEVELS,
        "difficulty_level",
        "Difficulty must be one of beginner, intermediate, advanced",
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkoutPlan {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 12, message = "Duration must be between 1 and 12 weeks"))]
    pub duration_weeks: i64,
    #[validate(range(min = 1, max = 7, message = "Workouts per week must be between 1 and 7"))]
    pub workouts_per_week: i64,
    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty_level: String,
    #[validate(length(min = 1, max = 2, message = "Plan must contain 1 or 2 weeks"), nested)]
    pub weeks: Vec<PlanWeek>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlanWeek {
    #[validate(range(min = 1, message = "Week number must be at least 1"))]
    pub week_number: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[validate(length(min = 1, message = "Week must contain at least one workout"), nested)]
    pub workouts: Vec<PlannedWorkout>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlannedWorkout {
    #[validate(custom(function = "validate_day"))]
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 10, max = 180, message = "Duration must be between 10 and 180 minutes"))]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_calories: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 10, message = "Workout must contain 1 to 10 exercises"), nested)]
    pub exercises: Vec<PlannedExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlannedExercise {
    #[validate(length(min = 1, message = "Exercise name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 20, message = "Sets must be between 1 and 20"))]
    pub sets: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_cues: Option<Vec<String>>,
}

/// JSON type expected for a plan field.
#[derive(Clone, Copy)]
enum Shape {
    Text,
    Integer,
    TextList,
    Objects(&'static [Field]),
}

struct Field {
    name: &'static str,
    shape: Shape,
    required: bool,
}

const fn field(name: &'static str, shape: Shape, required: bool) -> Field {
    Field {
        name,
        shape,
        required,
    }
}

const EXERCISE_FIELDS: &[Field] = &[
    field("name", Shape::Text, true),
    field("category", Shape::Text, false),
    field("sets", Shape::Integer, false),
    field("reps", Shape::Text, false),
    field("rest_seconds", Shape::Integer, false),
    field("notes", Shape::Text, false),
    field("form_cues", Shape::TextList, false),
];

const WORKOUT_FIELDS: &[Field] = &[
    field("day", Shape::Text, true),
    field("workout_type", Shape::Text, false),
    field("duration_minutes", Shape::Integer, false),
    field("estimated_calories", Shape::Integer, false),
    field("description", Shape::Text, false),
    field("exercises", Shape::Objects(EXERCISE_FIELDS), true),
];

const WEEK_FIELDS: &[Field] = &[
    field("week_number", Shape::Integer, true),
    field("focus", Shape::Text, false),
    field("workouts", Shape::Objects(WORKOUT_FIELDS), true),
];

const PLAN_FIELDS: &[Field] = &[
    field("title", Shape::Text, true),
    field("description", Shape::Text, false),
    field("duration_weeks", Shape::Integer, true),
    field("workouts_per_week", Shape::Integer, true),
    field("difficulty_level", Shape::Text, true),
    field("weeks", Shape::Objects(WEEK_FIELDS), true),
];

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn mismatch(errors: &mut FieldErrors, path: &str, expected: &str, value: &Value) {
    errors.add(path, format!("Expected {expected}, received {}", type_name(value)));
}

/// Checks JSON types across the whole plan, collecting one error per bad field.
///
/// Whole-number floats in integer fields (`45.0`) are rewritten to integers.
pub fn check_plan_types(value: &mut Value) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_object(value, PLAN_FIELDS, "", &mut errors);
    errors
}

fn check_object(value: &mut Value, fields: &[Field], path: &str, errors: &mut FieldErrors) {
    let Value::Object(map) = value else {
        mismatch(errors, path, "object", value);
        return;
    };

    for field in fields {
        let field_path = join(path, field.name);
        match map.get_mut(field.name) {
            None if field.required => errors.add(field_path, "Required"),
            None => {}
            Some(Value::Null) if !field.required => {}
            Some(inner) => check_shape(inner, field.shape, &field_path, errors),
        }
    }
}

fn check_shape(value: &mut Value, shape: Shape, path: &str, errors: &mut FieldErrors) {
    match shape {
        Shape::Text => {
            if !value.is_string() {
                mismatch(errors, path, "string", value);
            }
        }
        Shape::Integer => check_integer(value, path, errors),
        Shape::TextList => match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        mismatch(errors, &join(path, &index.to_string()), "string", item);
                    }
                }
            }
            other => mismatch(errors, path, "array", other),
        },
        Shape::Objects(fields) => match value {
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    check_object(item, fields, &join(path, &index.to_string()), errors);
                }
            }
            other => mismatch(errors, path, "array", other),
        },
    }
}

fn check_integer(value: &mut Value, path: &str, errors: &mut FieldErrors) {
    let Value::Number(number) = value else {
        mismatch(errors, path, "number", value);
        return;
    };
    if number.is_i64() {
        return;
    }

    match number.as_f64() {
        Some(float)
            if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 =>
        {
            *value = Value::from(float as i64);
        }
        _ => errors.add(path, "Expected integer, received float"),
    }
}
