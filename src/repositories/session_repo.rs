use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::session::SESSION_TTL_DAYS;

#[derive(Clone)]
pub struct SessionRepository {
    pool: DbPool,
}

impl SessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new session for a user. Returns the session token.
    pub async fn create(&self, user_id: &str) -> Result<String> {
        let pool = self.pool.clone();
        let token = Uuid::new_v4().to_string();
        let user_id = user_id.to_string();
        let now = Utc::now();
        let expires_at = now + Duration::days(SESSION_TTL_DAYS);

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![token, user_id, now, expires_at],
            )?;
            Ok(token)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Find a non-expired session and return its user id.
    /// Expired sessions are deleted on lookup.
    pub async fn find_valid(&self, token: &str) -> Result<Option<String>> {
        let pool = self.pool.clone();
        let token = token.to_string();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let result: Option<(String, DateTime<Utc>)> = conn
                .query_row(
                    "SELECT user_id, expires_at FROM sessions WHERE token = ?",
                    [&token],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match result {
                Some((_, expires_at)) if expires_at <= now => {
                    conn.execute("DELETE FROM sessions WHERE token = ?", [&token])?;
                    Ok(None)
                }
                Some((user_id, _)) => Ok(Some(user_id)),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Delete a single session (logout).
    pub async fn delete(&self, token: &str) -> Result<()> {
        let pool = self.pool.clone();
        let token = token.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute("DELETE FROM sessions WHERE token = ?", [&token])?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Batch delete all expired sessions, returning how many were removed.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let pool = self.pool.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let removed = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?",
                rusqlite::params![now],
            )?;
            Ok(removed)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;
    use crate::repositories::UserRepository;
    use tokio_test::assert_ok;

    async fn setup() -> (DbPool, String) {
        let pool = create_memory_pool().unwrap();
        run_migrations_for_tests(&pool).unwrap();
        let user = UserRepository::new(pool.clone())
            .create("s@example.com", "S", "password")
            .await
            .unwrap();
        (pool, user.id)
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (pool, user_id) = setup().await;
        let repo = SessionRepository::new(pool);

        let token = assert_ok!(repo.create(&user_id).await);
        assert_eq!(repo.find_valid(&token).await.unwrap(), Some(user_id));

        assert_ok!(repo.delete(&token).await);
        assert_eq!(repo.find_valid(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let (pool, user_id) = setup().await;
        let repo = SessionRepository::new(pool.clone());
        let past = Utc::now() - Duration::days(1);

        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ('old', ?, ?, ?)",
                rusqlite::params![user_id, past, past],
            )
            .unwrap();
        }

        assert_eq!(repo.cleanup_expired().await.unwrap(), 1);
        assert_eq!(repo.find_valid("old").await.unwrap(), None);
    }
}
