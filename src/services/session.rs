//! Session manager
//!
//! Issues, validates and revokes login sessions.
//!
//! Tokens are random UUIDv4 strings. Expired rows are never returned by the
//! store, so a session stops validating the moment `expires_at` passes even if
//! the periodic sweep has not run yet.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use crate::services::error::{ServiceError, ServiceResult};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime in days
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 7;

/// Remaining lifetime above which a validated session is extended
const RENEWAL_THRESHOLD_HOURS: i64 = 1;

/// Session manager
pub struct SessionManager {
    session_repo: Arc<dyn SessionRepository>,
    user_repo: Arc<dyn UserRepository>,
    lifetime: Duration,
}

impl SessionManager {
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self::with_lifetime_days(session_repo, user_repo, DEFAULT_SESSION_LIFETIME_DAYS)
    }

    pub fn with_lifetime_days(
        session_repo: Arc<dyn SessionRepository>,
        user_repo: Arc<dyn UserRepository>,
        lifetime_days: i64,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            lifetime: Duration::days(lifetime_days),
        }
    }

    /// Session lifetime, also used as the cookie Max-Age
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Start a new session for an existing user
    pub async fn create_session(&self, user_id: i64) -> ServiceResult<Session> {
        if self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to look up session user")?
            .is_none()
        {
            return Err(ServiceError::not_found("User not found"));
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + self.lifetime,
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::debug!("Session created for user {}", user_id);
        Ok(created)
    }

    /// Resolve a token to its live session.
    ///
    /// Returns `None` for an empty, unknown or expired token. When more than
    /// an hour of lifetime remains, the returned session's expiry is moved to
    /// now + lifetime. The extension is not written back to the store, so the
    /// persisted expiry still governs when the token stops working.
    pub async fn validate_session(&self, token: &str) -> ServiceResult<Option<Session>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let mut session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        // Sessions within the last hour are left to run out.
        if session.remaining() > Duration::hours(RENEWAL_THRESHOLD_HOURS) {
            session.expires_at = Utc::now() + self.lifetime;
        }

        Ok(Some(session))
    }

    /// Resolve a token to the user it belongs to
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Option<User>> {
        let session = match self.validate_session(token).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get session user")?;

        Ok(user)
    }

    /// Delete a session. Returns whether a row was removed.
    pub async fn logout(&self, token: &str) -> ServiceResult<bool> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(false);
        }

        let removed = self
            .session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;

        Ok(removed)
    }

    /// Remove expired sessions from the store
    pub async fn cleanup_expired(&self) -> ServiceResult<u64> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }
}
