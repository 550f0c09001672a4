use serde::Serialize;

/// Per-user ceilings on AI usage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaLimits {
    /// Requests in the trailing 24 hours.
    pub daily_requests: i64,
    /// Estimated USD spent in the trailing 30 days.
    pub monthly_cost: f64,
    /// Tokens in the trailing 24 hours.
    pub daily_tokens: i64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            daily_requests: 10,
            monthly_cost: 5.0,
            daily_tokens: 50_000,
        }
    }
}

/// Aggregated usage counters for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QuotaUsage {
    pub daily_requests: i64,
    pub daily_tokens: i64,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaDecision {
    pub can_proceed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QuotaDecision {
    fn allow() -> Self {
        Self {
            can_proceed: true,
            reason: None,
        }
    }

    fn deny(reason: &str) -> Self {
        Self {
            can_proceed: false,
            reason: Some(reason.to_string()),
        }
    }
}

impl QuotaLimits {
    /// A limit that is met counts as exceeded.
    pub fn check(&self, usage: &QuotaUsage) -> QuotaDecision {
        if usage.daily_requests >= self.daily_requests {
            return QuotaDecision::deny("Daily request limit exceeded");
        }
        if usage.monthly_cost >= self.monthly_cost {
            return QuotaDecision::deny("Monthly cost limit exceeded");
        }
        if usage.daily_tokens >= self.daily_tokens {
            return QuotaDecision::deny("Daily token limit exceeded");
        }
        QuotaDecision::allow()
    }
}
