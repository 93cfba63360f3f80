//! Session repository
//!
//! Database operations for user sessions.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait on SQLite
//!
//! Lookups never return expired rows, so correctness does not depend on
//! `delete_expired` having run.

use crate::db::Database;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a session. The caller assigns the id.
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get an unexpired session by its token
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session, returning whether a row was removed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: SqlitePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create session")?;

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, expires_at, created_at
            FROM sessions
            WHERE id = ? AND expires_at > ?
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get session by ID")?;

        Ok(row.map(|row| Session {
            id: row.get("id"),
            user_id: row.get("user_id"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{create_test_user, migrated_pool};
    use chrono::Duration;
    use uuid::Uuid;

    async fn setup_test_repo() -> (Database, SqlxSessionRepository) {
        let pool = migrated_pool().await;
        let repo = SqlxSessionRepository::new(pool.clone());
        (pool, repo)
    }

    fn session_for(user_id: i64, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (pool, repo) = setup_test_repo().await;
        let user = create_test_user(&pool, "alice").await;

        let session = session_for(user.id, Duration::days(7));
        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, user.id);
    }

    #[tokio::test]
    async fn test_get_session_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id("nonexistent").await.expect("Failed to get session");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_hidden_before_sweep() {
        let (pool, repo) = setup_test_repo().await;
        let user = create_test_user(&pool, "alice").await;

        let session = session_for(user.id, Duration::seconds(-1));
        repo.create(&session).await.expect("Failed to create session");

        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_requires_existing_user() {
        let (_pool, repo) = setup_test_repo().await;

        let result = repo.create(&session_for(4242, Duration::days(7))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_session_reports_removal() {
        let (pool, repo) = setup_test_repo().await;
        let user = create_test_user(&pool, "alice").await;

        let session = session_for(user.id, Duration::days(7));
        repo.create(&session).await.unwrap();

        assert!(repo.delete(&session.id).await.unwrap());
        assert!(!repo.delete(&session.id).await.unwrap());
        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let (pool, repo) = setup_test_repo().await;
        let user = create_test_user(&pool, "alice").await;

        let expired = session_for(user.id, Duration::days(-1));
        let valid = session_for(user.id, Duration::days(7));
        repo.create(&expired).await.unwrap();
        repo.create(&valid).await.unwrap();

        assert_eq!(repo.delete_expired().await.unwrap(), 1);
        assert!(repo.get_by_id(&valid.id).await.unwrap().is_some());
        // Already swept
        assert_eq!(repo.delete_expired().await.unwrap(), 0);
    }
}
