//! Wishlist item repository
//!
//! Database operations for wishlist items, including the conditional
//! reservation updates.
//!
//! `reserve` and `unreserve` are single guarded UPDATE statements whose
//! affected-row count is the success signal, so concurrent callers cannot
//! both win.

use crate::db::Database;
use crate::models::WishlistItem;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

const ITEM_COLUMNS: &str = "id, title, description, price, image_url, desire_level, comment, \
     wishlist_id, is_reserved, reserved_by_user_id, created_at";

/// Wishlist item repository trait
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Create a new item
    async fn create(&self, item: &WishlistItem) -> Result<WishlistItem>;

    /// Get item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<WishlistItem>>;

    /// List items of a wishlist, newest first
    async fn list_by_wishlist(&self, wishlist_id: i64) -> Result<Vec<WishlistItem>>;

    /// Image URLs of every item in every wishlist a user owns
    async fn list_image_urls_by_owner(&self, user_id: i64) -> Result<Vec<String>>;

    /// Update the editable fields. Reservation fields are left untouched.
    async fn update(&self, item: &WishlistItem) -> Result<WishlistItem>;

    /// Delete an item
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Reserve an item for `user_id` if nobody holds it. Returns whether the
    /// reservation was taken.
    async fn reserve(&self, id: i64, user_id: i64) -> Result<bool>;

    /// Release a reservation held by `user_id`. Returns whether it was released.
    async fn unreserve(&self, id: i64, user_id: i64) -> Result<bool>;

    /// Count items in a wishlist
    async fn count_by_wishlist(&self, wishlist_id: i64) -> Result<i64>;

    /// Count items across all wishlists owned by a user
    async fn count_by_owner(&self, user_id: i64) -> Result<i64>;

    /// Count items reserved by a user
    async fn count_reserved_by(&self, user_id: i64) -> Result<i64>;
}

/// SQLx-based item repository implementation
pub struct SqlxItemRepository {
    pool: SqlitePool,
}

impl SqlxItemRepository {
    /// Create a new SQLx item repository
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn ItemRepository> {
        Arc::new(Self::new(db))
    }

    /// Run a `SELECT COUNT(*) ... WHERE x = ?` query
    async fn count(&self, sql: &str, key: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count items")?;
        Ok(count)
    }
}

#[async_trait]
impl ItemRepository for SqlxItemRepository {
    async fn create(&self, item: &WishlistItem) -> Result<WishlistItem> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO wishlist_items (title, description, price, image_url, desire_level, comment, wishlist_id, is_reserved, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.image_url)
        .bind(item.desire_level)
        .bind(&item.comment)
        .bind(item.wishlist_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create item")?;

        Ok(WishlistItem {
            id: result.last_insert_rowid(),
            is_reserved: false,
            reserved_by_user_id: None,
            created_at: now,
            ..item.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<WishlistItem>> {
        let sql = format!("SELECT {} FROM wishlist_items WHERE id = ?", ITEM_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get item by ID")?;

        Ok(row.as_ref().map(row_to_item))
    }

    async fn list_by_wishlist(&self, wishlist_id: i64) -> Result<Vec<WishlistItem>> {
        let sql = format!(
            "SELECT {} FROM wishlist_items WHERE wishlist_id = ? ORDER BY created_at DESC, id DESC",
            ITEM_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(wishlist_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list items by wishlist")?;

        Ok(rows.iter().map(row_to_item).collect())
    }

    async fn list_image_urls_by_owner(&self, user_id: i64) -> Result<Vec<String>> {
        let urls: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT i.image_url
            FROM wishlist_items i
            INNER JOIN wishlists w ON w.id = i.wishlist_id
            WHERE w.user_id = ? AND i.image_url IS NOT NULL AND i.image_url <> ''
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list item images by owner")?;
        Ok(urls)
    }

    async fn update(&self, item: &WishlistItem) -> Result<WishlistItem> {
        sqlx::query(
            r#"
            UPDATE wishlist_items
            SET title = ?, description = ?, price = ?, image_url = ?, desire_level = ?, comment = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.image_url)
        .bind(item.desire_level)
        .bind(&item.comment)
        .bind(item.id)
        .execute(&self.pool)
        .await
        .context("Failed to update item")?;

        self.get_by_id(item.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Item not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete item")?;
        Ok(result.rows_affected() > 0)
    }

    async fn reserve(&self, id: i64, user_id: i64) -> Result<bool> {
        // A reservation whose holder was deleted (reserved_by NULL) is up for grabs again.
        let result = sqlx::query(
            r#"
            UPDATE wishlist_items
            SET is_reserved = 1, reserved_by_user_id = ?
            WHERE id = ? AND (is_reserved = 0 OR reserved_by_user_id IS NULL)
            "#,
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to reserve item")?;

        Ok(result.rows_affected() > 0)
    }

    async fn unreserve(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE wishlist_items
            SET is_reserved = 0, reserved_by_user_id = NULL
            WHERE id = ? AND is_reserved = 1 AND reserved_by_user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to unreserve item")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_wishlist(&self, wishlist_id: i64) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM wishlist_items WHERE wishlist_id = ?", wishlist_id)
            .await
    }

    async fn count_by_owner(&self, user_id: i64) -> Result<i64> {
        self.count(
            r#"
            SELECT COUNT(*)
            FROM wishlist_items i
            INNER JOIN wishlists w ON w.id = i.wishlist_id
            WHERE w.user_id = ?
            "#,
            user_id,
        )
        .await
    }

    async fn count_reserved_by(&self, user_id: i64) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM wishlist_items WHERE reserved_by_user_id = ?",
            user_id,
        )
        .await
    }
}

fn row_to_item(row: &SqliteRow) -> WishlistItem {
    WishlistItem {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        image_url: row.get("image_url"),
        desire_level: row.get("desire_level"),
        comment: row.get("comment"),
        wishlist_id: row.get("wishlist_id"),
        is_reserved: row.get("is_reserved"),
        reserved_by_user_id: row.get("reserved_by_user_id"),
        created_at: row.get("created_at"),
    }
}
