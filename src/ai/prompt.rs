use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::client::ChatMessage;
use super::schema::DIFFICULTY_LEVELS;
use crate::validation::one_of;

pub const PRIMARY_GOALS: [&str; 5] = [
    "weight_loss",
    "muscle_building",
    "strength",
    "endurance",
    "general_fitness",
];

pub const FITNESS_COACH_SYSTEM_PROMPT: &str = "\
You are a certified strength and conditioning coach who writes training plans.

Coaching rules:
- Safety and correct technique come first
- Programs progress gradually and stay sustainable
- Use plain, widely known exercise names
- Keep every text field short

Output rules:
- Reply with a single JSON object and nothing else: no markdown, no code fences, no commentary
- The reply starts with { and ends with }
- Use exactly the keys of the structure you are given, in the same order
- Include every required field
- Day names are lowercase: monday, tuesday, wednesday, thursday, friday, saturday, sunday
- Difficulty levels are lowercase: beginner, intermediate, advanced
- sets, duration_minutes, estimated_calories and rest_seconds are integers
- Strings use double quotes, no trailing commas";

fn validate_fitness_level(level: &str) -> Result<(), ValidationError> {
    one_of(
        level,
        &DIFFICULTY_LEVELS,
        "fitness_level",
        "Fitness level must be one of beginner, intermediate, advanced",
    )
}

fn validate_primary_goal(goal: &str) -> Result<(), ValidationError> {
    one_of(
        goal,
        &PRIMARY_GOALS,
        "primary_goal",
        "Primary goal must be one of weight_loss, muscle_building, strength, endurance, general_fitness",
    )
}

/// A user's training profile, the input to plan generation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlanRequest {
    #[validate(custom(function = "validate_fitness_level"))]
    pub fitness_level: String,
    #[validate(custom(function = "validate_primary_goal"))]
    pub primary_goal: String,
    #[validate(range(min = 1, max = 7, message = "Available days must be between 1 and 7"))]
    pub available_days: i64,
    #[validate(range(min = 15, max = 120, message = "Session duration must be between 15 and 120 minutes"))]
    pub session_duration: i64,
    #[validate(length(min = 1, message = "Select at least one equipment option"))]
    pub equipment: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 50, message = "Experience must be between 0 and 50 years"))]
    pub experience_years: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_workout_types: Option<Vec<String>>,
}

impl PlanRequest {
    fn equipment_list(&self) -> String {
        if self.equipment.is_empty() {
            "bodyweight only".to_string()
        } else {
            self.equipment.join(", ")
        }
    }

    fn limitations_line(&self) -> String {
        match self.limitations.as_deref() {
            Some(limitations) if !limitations.is_empty() => {
                format!("Limitations to work around: {}", limitations.join(", "))
            }
            _ => "No reported limitations".to_string(),
        }
    }
}

pub fn create_workout_plan_prompt(request: &PlanRequest) -> String {
    let equipment = request.equipment_list();
    let days = request.available_days;
    let duration = request.session_duration;
    let level = &request.fitness_level;

    let preferences = match request.preferred_workout_types.as_deref() {
        Some(types) if !types.is_empty() => format!("\n- Preferred Workout Types: {}", types.join(", ")),
        _ => String::new(),
    };

    format!(
        r#"Design a {goal} workout plan for this athlete.

PROFILE:
- Fitness Level: {level}
- Primary Goal: {goal}
- Available Days: {days} days per week
- Session Duration: {duration} minutes per workout
- Equipment: {equipment}
- {limitations}
- Experience: {experience} years{preferences}

REQUIREMENTS:
1. Two weeks: week 1 builds a foundation, week 2 raises intensity
2. Exactly {days} workouts per week
3. No workout longer than {duration} minutes
4. Use only this equipment: {equipment}
5. 4 to 6 exercises per workout, favouring compound movements
6. One or two short form cues per exercise
7. Scale volume and exercise choice to a {level} athlete

REQUIRED JSON STRUCTURE:
{{
  "title": "string",
  "description": "string",
  "duration_weeks": 2,
  "workouts_per_week": {days},
  "difficulty_level": "{level}",
  "weeks": [
    {{
      "week_number": 1,
      "focus": "string",
      "workouts": [
        {{
          "day": "monday",
          "workout_type": "string",
          "duration_minutes": integer,
          "estimated_calories": integer,
          "description": "string",
          "exercises": [
            {{
              "name": "string",
              "category": "string",
              "sets": integer,
              "reps": "string",
              "rest_seconds": integer,
              "notes": "string",
              "form_cues": ["string"]
            }}
          ]
        }}
      ]
    }}
  ]
}}"#,
        goal = request.primary_goal,
        limitations = request.limitations_line(),
        experience = request.experience_years.unwrap_or(0),
    )
}

/// System instructions followed by the rendered profile prompt.
pub fn build_plan_messages(request: &PlanRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(FITNESS_COACH_SYSTEM_PROMPT),
        ChatMessage::user(create_workout_plan_prompt(request)),
    ]
}
