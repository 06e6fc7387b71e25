//! Database operations for setup state tokens.
//!
//! The browser generates an opaque token before redirecting to GitHub's
//! manifest-creation page; GitHub echoes it back in the callback query
//! string. A token is valid for one consumption within its expiry window.

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;

use super::DbPool;
use crate::error::{ConnectorError, Result};

/// A one-time setup state token.
#[derive(Debug, Clone)]
pub struct SetupState {
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl SetupState {
    /// Wraps a client-generated token with the default expiry (10 minutes).
    pub fn new(state: &str) -> Self {
        let now = Utc::now();
        Self {
            state: state.to_string(),
            created_at: now,
            expires_at: now + Duration::minutes(10),
            consumed_at: None,
        }
    }
}

/// Setup state repository.
pub struct SetupStateRepo;

impl SetupStateRepo {
    /// Stores a new state token. Re-posting the same token is an error
    /// (PRIMARY KEY), which keeps tokens single-use from creation.
    pub async fn create(pool: &DbPool, state: &SetupState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO setup_states (state, created_at, expires_at, consumed_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&state.state)
        .bind(state.created_at.to_rfc3339())
        .bind(state.expires_at.to_rfc3339())
        .bind(state.consumed_at.map(|t| t.to_rfc3339()))
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Atomically validates and consumes a state token.
    /// Returns the state if it exists, has not expired, and was not
    /// already consumed.
    pub async fn consume(pool: &DbPool, state: &str) -> Result<Option<SetupState>> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE setup_states
            SET consumed_at = ?
            WHERE state = ? AND consumed_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(&now_str)
        .bind(state)
        .bind(&now_str)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            SELECT state, created_at, expires_at, consumed_at
            FROM setup_states
            WHERE state = ?
            "#,
        )
        .bind(state)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        row.map(|r| Self::row_to_state(&r)).transpose()
    }

    /// Removes expired tokens. Returns the number deleted.
    pub async fn purge_expired(pool: &DbPool) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("DELETE FROM setup_states WHERE expires_at <= ?")
            .bind(&now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn row_to_state(row: &sqlx::sqlite::SqliteRow) -> Result<SetupState> {
        let created_at_str: String = row.get("created_at");
        let expires_at_str: String = row.get("expires_at");
        let consumed_at_str: Option<String> = row.get("consumed_at");

        Ok(SetupState {
            state: row.get("state"),
            created_at: parse_datetime(&created_at_str)?,
            expires_at: parse_datetime(&expires_at_str)?,
            consumed_at: consumed_at_str.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ConnectorError::DateParse {
            field: "setup_states",
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};

    async fn test_pool() -> DbPool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_consume_once() {
        let pool = test_pool().await;

        SetupStateRepo::create(&pool, &SetupState::new("abc123"))
            .await
            .unwrap();

        let consumed = SetupStateRepo::consume(&pool, "abc123").await.unwrap();
        assert!(consumed.is_some());
        assert!(consumed.unwrap().consumed_at.is_some());

        // Second consumption fails
        let again = SetupStateRepo::consume(&pool, "abc123").await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_consume_unknown() {
        let pool = test_pool().await;

        let consumed = SetupStateRepo::consume(&pool, "never-posted").await.unwrap();
        assert!(consumed.is_none());
    }

    #[tokio::test]
    async fn test_consume_expired() {
        let pool = test_pool().await;

        let mut state = SetupState::new("expired");
        state.expires_at = Utc::now() - Duration::minutes(1);
        SetupStateRepo::create(&pool, &state).await.unwrap();

        let consumed = SetupStateRepo::consume(&pool, "expired").await.unwrap();
        assert!(consumed.is_none());

        assert_eq!(SetupStateRepo::purge_expired(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected() {
        let pool = test_pool().await;

        SetupStateRepo::create(&pool, &SetupState::new("dup"))
            .await
            .unwrap();
        let result = SetupStateRepo::create(&pool, &SetupState::new("dup")).await;
        assert!(result.is_err());
    }
}
