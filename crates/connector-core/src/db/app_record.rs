//! Database operations for GitHub App records.

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::DbPool;
use crate::error::{ConnectorError, Result};

/// A GitHub App created via the manifest flow, keyed by the owning
/// GitHub user's id. The PRIMARY KEY enforces at most one record per
/// user; a second setup run replaces the first.
#[derive(Debug, Clone)]
pub struct AppRecord {
    pub github_user_id: i64,
    pub app_id: i64,
    pub name: String,
    pub slug: String,
    pub owner_login: String,
    pub owner_type: String, // "User" or "Organization"
    pub client_id: String,
    pub client_secret_encrypted: Vec<u8>,
    pub client_secret_nonce: Vec<u8>,
    pub webhook_secret_encrypted: Vec<u8>,
    pub webhook_secret_nonce: Vec<u8>,
    pub private_key_encrypted: Vec<u8>,
    pub private_key_nonce: Vec<u8>,
    pub html_url: String,
    /// Set once the user has installed the app and the install callback
    /// has been posted back.
    pub installation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// App record repository.
pub struct AppRecordRepo;

impl AppRecordRepo {
    /// Creates or replaces the record for the record's user id.
    pub async fn upsert(pool: &DbPool, record: &AppRecord) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO github_app_records (
                github_user_id, app_id, name, slug, owner_login, owner_type,
                client_id, client_secret_encrypted, client_secret_nonce,
                webhook_secret_encrypted, webhook_secret_nonce,
                private_key_encrypted, private_key_nonce,
                html_url, installation_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(github_user_id) DO UPDATE SET
                app_id = excluded.app_id,
                name = excluded.name,
                slug = excluded.slug,
                owner_login = excluded.owner_login,
                owner_type = excluded.owner_type,
                client_id = excluded.client_id,
                client_secret_encrypted = excluded.client_secret_encrypted,
                client_secret_nonce = excluded.client_secret_nonce,
                webhook_secret_encrypted = excluded.webhook_secret_encrypted,
                webhook_secret_nonce = excluded.webhook_secret_nonce,
                private_key_encrypted = excluded.private_key_encrypted,
                private_key_nonce = excluded.private_key_nonce,
                html_url = excluded.html_url,
                installation_id = excluded.installation_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.github_user_id)
        .bind(record.app_id)
        .bind(&record.name)
        .bind(&record.slug)
        .bind(&record.owner_login)
        .bind(&record.owner_type)
        .bind(&record.client_id)
        .bind(&record.client_secret_encrypted)
        .bind(&record.client_secret_nonce)
        .bind(&record.webhook_secret_encrypted)
        .bind(&record.webhook_secret_nonce)
        .bind(&record.private_key_encrypted)
        .bind(&record.private_key_nonce)
        .bind(&record.html_url)
        .bind(record.installation_id)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Gets the record for a GitHub user id.
    pub async fn get_by_user(pool: &DbPool, github_user_id: i64) -> Result<Option<AppRecord>> {
        let row = sqlx::query(
            r#"
            SELECT github_user_id, app_id, name, slug, owner_login, owner_type,
                   client_id, client_secret_encrypted, client_secret_nonce,
                   webhook_secret_encrypted, webhook_secret_nonce,
                   private_key_encrypted, private_key_nonce,
                   html_url, installation_id, created_at, updated_at
            FROM github_app_records
            WHERE github_user_id = ?
            "#,
        )
        .bind(github_user_id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    /// Deletes the record for a GitHub user id. Returns whether a record
    /// existed.
    pub async fn delete_by_user(pool: &DbPool, github_user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM github_app_records WHERE github_user_id = ?")
            .bind(github_user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Records the installation id after the install callback.
    pub async fn set_installation(
        pool: &DbPool,
        github_user_id: i64,
        installation_id: i64,
    ) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE github_app_records
            SET installation_id = ?, updated_at = ?
            WHERE github_user_id = ?
            "#,
        )
        .bind(installation_id)
        .bind(&now)
        .bind(github_user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<AppRecord> {
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(AppRecord {
            github_user_id: row.get("github_user_id"),
            app_id: row.get("app_id"),
            name: row.get("name"),
            slug: row.get("slug"),
            owner_login: row.get("owner_login"),
            owner_type: row.get("owner_type"),
            client_id: row.get("client_id"),
            client_secret_encrypted: row.get("client_secret_encrypted"),
            client_secret_nonce: row.get("client_secret_nonce"),
            webhook_secret_encrypted: row.get("webhook_secret_encrypted"),
            webhook_secret_nonce: row.get("webhook_secret_nonce"),
            private_key_encrypted: row.get("private_key_encrypted"),
            private_key_nonce: row.get("private_key_nonce"),
            html_url: row.get("html_url"),
            installation_id: row.get("installation_id"),
            created_at: parse_datetime(&created_at_str, "created_at")?,
            updated_at: parse_datetime(&updated_at_str, "updated_at")?,
        })
    }
}

fn parse_datetime(s: &str, field: &'static str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ConnectorError::DateParse {
            field,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};

    fn test_record(github_user_id: i64) -> AppRecord {
        let now = Utc::now();
        AppRecord {
            github_user_id,
            app_id: 4242,
            name: "OpenShift Actions Connector".to_string(),
            slug: "openshift-actions-connector".to_string(),
            owner_login: "octocat".to_string(),
            owner_type: "User".to_string(),
            client_id: "Iv1.abc123".to_string(),
            client_secret_encrypted: vec![1, 2, 3],
            client_secret_nonce: vec![0; 12],
            webhook_secret_encrypted: vec![4, 5, 6],
            webhook_secret_nonce: vec![0; 12],
            private_key_encrypted: vec![7, 8, 9],
            private_key_nonce: vec![0; 12],
            html_url: "https://github.com/apps/openshift-actions-connector".to_string(),
            installation_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_pool() -> DbPool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let pool = test_pool().await;

        assert!(AppRecordRepo::get_by_user(&pool, 77).await.unwrap().is_none());

        AppRecordRepo::upsert(&pool, &test_record(77)).await.unwrap();
        let fetched = AppRecordRepo::get_by_user(&pool, 77).await.unwrap().unwrap();
        assert_eq!(fetched.app_id, 4242);
        assert_eq!(fetched.slug, "openshift-actions-connector");
        assert!(fetched.installation_id.is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let pool = test_pool().await;

        AppRecordRepo::upsert(&pool, &test_record(77)).await.unwrap();

        let mut replacement = test_record(77);
        replacement.app_id = 9999;
        replacement.slug = "second-app".to_string();
        AppRecordRepo::upsert(&pool, &replacement).await.unwrap();

        let fetched = AppRecordRepo::get_by_user(&pool, 77).await.unwrap().unwrap();
        assert_eq!(fetched.app_id, 9999);
        assert_eq!(fetched.slug, "second-app");
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;

        AppRecordRepo::upsert(&pool, &test_record(77)).await.unwrap();
        assert!(AppRecordRepo::delete_by_user(&pool, 77).await.unwrap());
        assert!(AppRecordRepo::get_by_user(&pool, 77).await.unwrap().is_none());

        // Deleting again reports nothing deleted
        assert!(!AppRecordRepo::delete_by_user(&pool, 77).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_installation() {
        let pool = test_pool().await;

        AppRecordRepo::upsert(&pool, &test_record(77)).await.unwrap();
        assert!(AppRecordRepo::set_installation(&pool, 77, 31337).await.unwrap());

        let fetched = AppRecordRepo::get_by_user(&pool, 77).await.unwrap().unwrap();
        assert_eq!(fetched.installation_id, Some(31337));

        // No record, nothing updated
        assert!(!AppRecordRepo::set_installation(&pool, 78, 31337).await.unwrap());
    }
}
