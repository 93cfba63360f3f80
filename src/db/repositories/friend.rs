//! Friend wishlist repository
//!
//! Database operations for wishlists a user has saved from other people.

use crate::db::repositories::write_error;
use crate::db::Database;
use crate::models::{FriendWishlist, FriendWishlistEntry, Theme, Wishlist};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

const FRIEND_COLUMNS: &str = "id, user_id, wishlist_id, friend_name, created_at";

const ENTRY_SELECT: &str = r#"
    SELECT f.id AS f_id, f.user_id AS f_user_id, f.wishlist_id AS f_wishlist_id,
           f.friend_name AS f_friend_name, f.created_at AS f_created_at,
           w.title AS w_title, w.description AS w_description, w.event_date AS w_event_date,
           w.theme_id AS w_theme_id, w.user_id AS w_user_id, w.share_token AS w_share_token,
           w.created_at AS w_created_at, w.updated_at AS w_updated_at,
           t.id AS t_id, t.name AS t_name, t.color AS t_color,
           t.background AS t_background, t.button_color AS t_button_color
    FROM friend_wishlists f
    INNER JOIN wishlists w ON w.id = f.wishlist_id
    LEFT JOIN themes t ON t.id = w.theme_id
    WHERE f.user_id = ?
    ORDER BY f.created_at DESC, f.id DESC
"#;

/// Friend wishlist repository trait
#[async_trait]
pub trait FriendRepository: Send + Sync {
    /// Save a bookmark.
    ///
    /// Saving the same wishlist twice fails with `UniqueViolation`.
    async fn create(&self, friend: &FriendWishlist) -> Result<FriendWishlist>;

    /// Get bookmark by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<FriendWishlist>>;

    /// Find the bookmark `user_id` holds for `wishlist_id`, if any
    async fn get_by_user_and_wishlist(
        &self,
        user_id: i64,
        wishlist_id: i64,
    ) -> Result<Option<FriendWishlist>>;

    /// List a user's bookmarks with their wishlists and themes, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<FriendWishlistEntry>>;

    /// Delete a bookmark
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based friend wishlist repository implementation
pub struct SqlxFriendRepository {
    pool: SqlitePool,
}

impl SqlxFriendRepository {
    /// Create a new SQLx friend wishlist repository
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn FriendRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl FriendRepository for SqlxFriendRepository {
    async fn create(&self, friend: &FriendWishlist) -> Result<FriendWishlist> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO friend_wishlists (user_id, wishlist_id, friend_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(friend.user_id)
        .bind(friend.wishlist_id)
        .bind(&friend.friend_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Failed to create friend wishlist"))?;

        Ok(FriendWishlist {
            id: result.last_insert_rowid(),
            created_at: now,
            ..friend.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<FriendWishlist>> {
        let sql = format!("SELECT {} FROM friend_wishlists WHERE id = ?", FRIEND_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get friend wishlist by ID")?;

        Ok(row.as_ref().map(row_to_friend))
    }

    async fn get_by_user_and_wishlist(
        &self,
        user_id: i64,
        wishlist_id: i64,
    ) -> Result<Option<FriendWishlist>> {
        let sql = format!(
            "SELECT {} FROM friend_wishlists WHERE user_id = ? AND wishlist_id = ?",
            FRIEND_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(wishlist_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up friend wishlist")?;

        Ok(row.as_ref().map(row_to_friend))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<FriendWishlistEntry>> {
        let rows = sqlx::query(ENTRY_SELECT)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list friend wishlists")?;

        Ok(rows.iter().map(row_to_entry).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM friend_wishlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete friend wishlist")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_friend(row: &SqliteRow) -> FriendWishlist {
    FriendWishlist {
        id: row.get("id"),
        user_id: row.get("user_id"),
        wishlist_id: row.get("wishlist_id"),
        friend_name: row.get("friend_name"),
        created_at: row.get("created_at"),
    }
}

/// Map one `ENTRY_SELECT` row. The theme is absent when the LEFT JOIN found none.
fn row_to_entry(row: &SqliteRow) -> FriendWishlistEntry {
    let wishlist_id: i64 = row.get("f_wishlist_id");
    let theme_id: Option<i64> = row.get("t_id");

    FriendWishlistEntry {
        friend: FriendWishlist {
            id: row.get("f_id"),
            user_id: row.get("f_user_id"),
            wishlist_id,
            friend_name: row.get("f_friend_name"),
            created_at: row.get("f_created_at"),
        },
        wishlist: Wishlist {
            id: wishlist_id,
            title: row.get("w_title"),
            description: row.get("w_description"),
            event_date: row.get("w_event_date"),
            theme_id: row.get("w_theme_id"),
            user_id: row.get("w_user_id"),
            share_token: row.get("w_share_token"),
            created_at: row.get("w_created_at"),
            updated_at: row.get("w_updated_at"),
        },
        theme: theme_id.map(|id| Theme {
            id,
            name: row.get("t_name"),
            color: row.get("t_color"),
            background: row.get("t_background"),
            button_color: row.get("t_button_color"),
        }),
    }
}
