use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    PlanGeneration,
    PlanModification,
    ExerciseSuggestion,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::PlanGeneration => "plan_generation",
            RequestType::PlanModification => "plan_modification",
            RequestType::ExerciseSuggestion => "exercise_suggestion",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "plan_modification" => RequestType::PlanModification,
            "exercise_suggestion" => RequestType::ExerciseSuggestion,
            _ => RequestType::PlanGeneration,
        }
    }
}

/// One external AI request: tokens, cost and outcome.
#[derive(Debug, Clone, Serialize)]
pub struct UsageLog {
    pub id: i64,
    pub user_id: String,
    pub request_type: RequestType,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub cost: f64,
    pub model: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub request_duration_ms: i64,
    pub timestamp: DateTime<Utc>,
}

impl FromSqliteRow for UsageLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let request_type: String = row.get("request_type")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            request_type: RequestType::parse(&request_type),
            prompt_tokens: row.get("prompt_tokens")?,
            completion_tokens: row.get("completion_tokens")?,
            total_tokens: row.get("total_tokens")?,
            cost: row.get("cost")?,
            model: row.get("model")?,
            success: row.get("success")?,
            error_message: row.get("error_message")?,
            request_duration_ms: row.get("request_duration_ms")?,
            timestamp: row.get("timestamp")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUsageLog {
    pub user_id: String,
    pub request_type: RequestType,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub cost: f64,
    pub model: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub request_duration_ms: i64,
}

/// Aggregated usage over a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub request_count: i64,
    pub successful_requests: i64,
    pub total_tokens: i64,
    pub total_cost: f64,
}

impl UsageSummary {
    /// Percentage of successful requests, 0 when there were none.
    pub fn success_rate(&self) -> f64 {
        if self.request_count == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.request_count as f64 * 100.0
    }
}

/// Per-type and per-model request counts plus average duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageBreakdown {
    pub failed_requests: i64,
    pub average_request_duration_ms: f64,
    pub requests_by_type: BTreeMap<&'static str, i64>,
    pub requests_by_model: BTreeMap<String, i64>,
}

impl UsageBreakdown {
    pub fn from_logs(logs: &[UsageLog]) -> Self {
        let mut breakdown = Self::default();
        if logs.is_empty() {
            return breakdown;
        }

        let mut total_duration = 0i64;
        for log in logs {
            if !log.success {
                breakdown.failed_requests += 1;
            }
            total_duration = total_duration.saturating_add(log.request_duration_ms);
            *breakdown
                .requests_by_type
                .entry(log.request_type.as_str())
                .or_default() += 1;
            *breakdown
                .requests_by_model
                .entry(log.model.clone())
                .or_default() += 1;
        }
        breakdown.average_request_duration_ms = total_duration as f64 / logs.len() as f64;
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_round_trips_through_str() {
        for kind in [
            RequestType::PlanGeneration,
            RequestType::PlanModification,
            RequestType::ExerciseSuggestion,
        ] {
            assert_eq!(RequestType::parse(kind.as_str()), kind);
        }
    }

    fn log(request_type: RequestType, model: &str, success: bool, duration: i64) -> UsageLog {
        UsageLog {
            id: 0,
            user_id: "u".to_string(),
            request_type,
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            cost: 0.0,
            model: model.to_string(),
            success,
            error_message: None,
            request_duration_ms: duration,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_breakdown_counts_types_and_models() {
        let logs = vec![
            log(RequestType::PlanGeneration, "gpt-4o-mini", true, 1000),
            log(RequestType::PlanGeneration, "gpt-4o", false, 3000),
            log(RequestType::ExerciseSuggestion, "gpt-4o-mini", true, 500),
        ];

        let breakdown = UsageBreakdown::from_logs(&logs);

        assert_eq!(breakdown.failed_requests, 1);
        assert_eq!(breakdown.average_request_duration_ms, 1500.0);
        assert_eq!(breakdown.requests_by_type.get("plan_generation"), Some(&2));
        assert_eq!(breakdown.requests_by_type.get("exercise_suggestion"), Some(&1));
        assert_eq!(breakdown.requests_by_model.get("gpt-4o-mini"), Some(&2));
        assert_eq!(breakdown.requests_by_model.get("gpt-4o"), Some(&1));
    }

    #[test]
    fn test_breakdown_of_no_logs() {
        assert_eq!(UsageBreakdown::from_logs(&[]), UsageBreakdown::default());
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(UsageSummary::default().success_rate(), 0.0);

        let summary = UsageSummary {
            request_count: 4,
            successful_requests: 3,
            total_tokens: 0,
            total_cost: 0.0,
        };
        assert_eq!(summary.success_rate(), 75.0);
    }
}
