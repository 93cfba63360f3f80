//! Authentication service
//!
//! Registration and login. Both end with a fresh session from the
//! `SessionManager`.

use crate::db::repositories::{UniqueViolation, UserRepository};
use crate::models::{Session, User};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::password::{hash_password, verify_password};
use crate::services::session::SessionManager;
use crate::services::validation;
use anyhow::Context;
use std::sync::Arc;

/// Registration form
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub login: String,
    pub password: String,
    pub confirm_password: String,
    pub username: String,
    pub email: String,
}

/// Authentication service
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    sessions: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, sessions: Arc<SessionManager>) -> Self {
        Self { user_repo, sessions }
    }

    /// Create an account and log it in.
    ///
    /// Username and login are trimmed, the email is trimmed and lowercased.
    pub async fn register(&self, input: RegisterInput) -> ServiceResult<(User, Session)> {
        let username = input.username.trim();
        let login = input.login.trim();
        let email = input.email.trim().to_lowercase();

        validation::validate_registration(
            username,
            &email,
            &input.password,
            &input.confirm_password,
        )?;

        if login.is_empty() {
            return Err(ServiceError::validation("Login is required"));
        }

        if self
            .user_repo
            .login_exists(login)
            .await
            .context("Failed to check login")?
        {
            return Err(ServiceError::validation(
                "A user with this login already exists",
            ));
        }

        if self
            .user_repo
            .email_exists(&email)
            .await
            .context("Failed to check email")?
        {
            return Err(ServiceError::validation(
                "A user with this email already exists",
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(username.to_string(), email, login.to_string(), password_hash);

        // A concurrent registration can take the login or email after the
        // checks above; the unique index is the final word.
        let created = match self.user_repo.create(&user).await {
            Ok(created) => created,
            Err(e) => {
                return Err(match e.downcast_ref::<UniqueViolation>() {
                    Some(v) if v.involves("users.email") => {
                        ServiceError::validation("A user with this email already exists")
                    }
                    Some(_) => ServiceError::validation("A user with this login already exists"),
                    None => e.context("Failed to create user").into(),
                })
            }
        };

        tracing::info!("User registered: {}", created.id);

        let session = self.sessions.create_session(created.id).await?;
        Ok((created, session))
    }

    /// Check credentials and open a session
    pub async fn login(&self, login: &str, password: &str) -> ServiceResult<(User, Session)> {
        let login = login.trim();
        if login.is_empty() || password.trim().is_empty() {
            return Err(ServiceError::validation("Login and password are required"));
        }

        let user = self
            .user_repo
            .get_by_login(login)
            .await
            .context("Failed to get user by login")?
            .ok_or_else(|| ServiceError::unauthorized("Invalid login or password"))?;

        if !verify_password(password, &user.password_hash) {
            tracing::debug!("Failed login attempt for user {}", user.id);
            return Err(ServiceError::unauthorized("Invalid login or password"));
        }

        let session = self.sessions.create_session(user.id).await?;
        Ok((user, session))
    }

    /// End a session. Unknown tokens are not an error.
    pub async fn logout(&self, token: &str) -> ServiceResult<bool> {
        self.sessions.logout(token).await
    }
}
