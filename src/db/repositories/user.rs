//! User repository
//!
//! Database operations for user accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait on SQLite

use crate::db::repositories::write_error;
use crate::db::Database;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

const USER_COLUMNS: &str =
    "id, username, email, login, password_hash, avatar_url, phone, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user.
    ///
    /// A taken login or email fails with `UniqueViolation`.
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by login name
    async fn get_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Check whether a login is taken
    async fn login_exists(&self, login: &str) -> Result<bool>;

    /// Check whether an email is taken
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Update profile fields (username, email, avatar, phone).
    ///
    /// An email owned by another account fails with `UniqueViolation`.
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user and, through cascades, everything the user owns
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(db))
    }

    async fn get_where(&self, column: &'static str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to get user by {}", column))?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn exists_where(&self, column: &'static str, value: &str) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM users WHERE {} = ?", column);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to check user {}", column))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, login, password_hash, avatar_url, phone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.phone)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Failed to create user"))?;

        Ok(User {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by id")?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<User>> {
        self.get_where("login", login).await
    }

    async fn login_exists(&self, login: &str) -> Result<bool> {
        self.exists_where("login", login).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        self.exists_where("email", email).await
    }

    async fn update(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, avatar_url = ?, phone = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.avatar_url)
        .bind(&user.phone)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Failed to update user"))?;

        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        login: row.get("login"),
        password_hash: row.get("password_hash"),
        avatar_url: row.get("avatar_url"),
        phone: row.get("phone"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
