use chrono::{DateTime, Duration, Utc};

use crate::ai::quota::QuotaUsage;
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, NewUsageLog, UsageLog, UsageSummary};

#[derive(Clone)]
pub struct UsageRepository {
    pool: DbPool,
}

impl UsageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, log: NewUsageLog) -> Result<()> {
        let pool = self.pool.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO ai_usage_logs
                    (user_id, request_type, prompt_tokens, completion_tokens, total_tokens, cost,
                     model, success, error_message, request_duration_ms, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    log.user_id,
                    log.request_type.as_str(),
                    log.prompt_tokens,
                    log.completion_tokens,
                    log.total_tokens,
                    log.cost,
                    log.model,
                    log.success,
                    log.error_message,
                    log.request_duration_ms,
                    now
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Logs at or after `since`, newest first.
    pub async fn find_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<UsageLog>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM ai_usage_logs
                 WHERE user_id = ? AND timestamp >= ?
                 ORDER BY timestamp DESC, id DESC",
            )?;
            let logs = stmt
                .query_map(rusqlite::params![user_id, since], UsageLog::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(logs)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn summary_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<UsageSummary> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let summary = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(success), 0), COALESCE(SUM(total_tokens), 0),
                        COALESCE(SUM(cost), 0.0)
                 FROM ai_usage_logs
                 WHERE user_id = ? AND timestamp >= ?",
                rusqlite::params![user_id, since],
                |row| {
                    Ok(UsageSummary {
                        request_count: row.get(0)?,
                        successful_requests: row.get(1)?,
                        total_tokens: row.get(2)?,
                        total_cost: row.get(3)?,
                    })
                },
            )?;
            Ok(summary)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Counters the quota gate decides on: the trailing day and the trailing 30 days.
    pub async fn quota_usage(&self, user_id: &str, now: DateTime<Utc>) -> Result<QuotaUsage> {
        let daily = self.summary_since(user_id, now - Duration::days(1)).await?;
        let monthly = self.summary_since(user_id, now - Duration::days(30)).await?;

        Ok(QuotaUsage {
            daily_requests: daily.request_count,
            daily_tokens: daily.total_tokens,
            monthly_cost: monthly.total_cost,
        })
    }
}
