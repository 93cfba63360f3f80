//! Wishlist repository
//!
//! Database operations for wishlists.
//!
//! This module provides:
//! - `WishlistRepository` trait defining the interface for wishlist data access
//! - `SqlxWishlistRepository` implementing the trait on SQLite

use crate::db::Database;
use crate::models::Wishlist;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

const WISHLIST_COLUMNS: &str =
    "id, title, description, event_date, theme_id, user_id, share_token, created_at, updated_at";

/// Wishlist repository trait
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Create a new wishlist
    async fn create(&self, wishlist: &Wishlist) -> Result<Wishlist>;

    /// Get wishlist by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Wishlist>>;

    /// Get wishlist by its share token
    async fn get_by_share_token(&self, token: &str) -> Result<Option<Wishlist>>;

    /// List a user's wishlists, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Wishlist>>;

    /// Count a user's wishlists
    async fn count_by_user(&self, user_id: i64) -> Result<i64>;

    /// Check whether `user_id` owns wishlist `id`
    async fn user_owns(&self, id: i64, user_id: i64) -> Result<bool>;

    /// Update title, description, event date and theme
    async fn update(&self, wishlist: &Wishlist) -> Result<Wishlist>;

    /// Delete a wishlist with its items, links and bookmarks
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based wishlist repository implementation
pub struct SqlxWishlistRepository {
    pool: SqlitePool,
}

impl SqlxWishlistRepository {
    /// Create a new SQLx wishlist repository
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn WishlistRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl WishlistRepository for SqlxWishlistRepository {
    async fn create(&self, wishlist: &Wishlist) -> Result<Wishlist> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO wishlists (title, description, event_date, theme_id, user_id, share_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&wishlist.title)
        .bind(&wishlist.description)
        .bind(wishlist.event_date)
        .bind(wishlist.theme_id)
        .bind(wishlist.user_id)
        .bind(&wishlist.share_token)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create wishlist")?;

        Ok(Wishlist {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..wishlist.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Wishlist>> {
        let sql = format!("SELECT {} FROM wishlists WHERE id = ?", WISHLIST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get wishlist by ID")?;

        Ok(row.as_ref().map(row_to_wishlist))
    }

    async fn get_by_share_token(&self, token: &str) -> Result<Option<Wishlist>> {
        let sql = format!("SELECT {} FROM wishlists WHERE share_token = ?", WISHLIST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get wishlist by share token")?;

        Ok(row.as_ref().map(row_to_wishlist))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Wishlist>> {
        let sql = format!(
            "SELECT {} FROM wishlists WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            WISHLIST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list wishlists by user")?;

        Ok(rows.iter().map(row_to_wishlist).collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlists WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count wishlists")?;
        Ok(count)
    }

    async fn user_owns(&self, id: i64, user_id: i64) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM wishlists WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check wishlist ownership")?;
        Ok(count > 0)
    }

    async fn update(&self, wishlist: &Wishlist) -> Result<Wishlist> {
        sqlx::query(
            r#"
            UPDATE wishlists
            SET title = ?, description = ?, event_date = ?, theme_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&wishlist.title)
        .bind(&wishlist.description)
        .bind(wishlist.event_date)
        .bind(wishlist.theme_id)
        .bind(Utc::now())
        .bind(wishlist.id)
        .execute(&self.pool)
        .await
        .context("Failed to update wishlist")?;

        self.get_by_id(wishlist.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Wishlist not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete wishlist")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_wishlist(row: &SqliteRow) -> Wishlist {
    Wishlist {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        event_date: row.get("event_date"),
        theme_id: row.get("theme_id"),
        user_id: row.get("user_id"),
        share_token: row.get("share_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
