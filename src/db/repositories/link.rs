//! Item link repository
//!
//! Database operations for item purchase links.

use crate::db::Database;
use crate::models::ItemLink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

const LINK_COLUMNS: &str = "id, url, title, price, is_from_ai, is_selected, item_id, created_at";

/// Item link repository trait
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Create a new link
    async fn create(&self, link: &ItemLink) -> Result<ItemLink>;

    /// Get link by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ItemLink>>;

    /// List links of an item in insertion order
    async fn list_by_item(&self, item_id: i64) -> Result<Vec<ItemLink>>;

    /// Count links of an item
    async fn count_by_item(&self, item_id: i64) -> Result<i64>;

    /// Delete a link
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Delete all links of an item
    async fn delete_by_item(&self, item_id: i64) -> Result<u64>;

    /// Mark `link_id` as the selected link of `item_id`, clearing the others
    async fn set_selected(&self, item_id: i64, link_id: i64) -> Result<()>;
}

/// SQLx-based link repository implementation
pub struct SqlxLinkRepository {
    pool: SqlitePool,
}

impl SqlxLinkRepository {
    /// Create a new SQLx link repository
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn LinkRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl LinkRepository for SqlxLinkRepository {
    async fn create(&self, link: &ItemLink) -> Result<ItemLink> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO item_links (url, title, price, is_from_ai, is_selected, item_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.url)
        .bind(&link.title)
        .bind(link.price)
        .bind(link.is_from_ai)
        .bind(link.is_selected)
        .bind(link.item_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create link")?;

        Ok(ItemLink {
            id: result.last_insert_rowid(),
            created_at: now,
            ..link.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ItemLink>> {
        let sql = format!("SELECT {} FROM item_links WHERE id = ?", LINK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get link by ID")?;

        Ok(row.as_ref().map(row_to_link))
    }

    async fn list_by_item(&self, item_id: i64) -> Result<Vec<ItemLink>> {
        let sql = format!(
            "SELECT {} FROM item_links WHERE item_id = ? ORDER BY id",
            LINK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list links by item")?;

        Ok(rows.iter().map(row_to_link).collect())
    }

    async fn count_by_item(&self, item_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item_links WHERE item_id = ?")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count links")?;
        Ok(count)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM item_links WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete link")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_item(&self, item_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM item_links WHERE item_id = ?")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete links by item")?;
        Ok(result.rows_affected())
    }

    async fn set_selected(&self, item_id: i64, link_id: i64) -> Result<()> {
        // One statement, so no reader ever sees zero or two selected links.
        sqlx::query("UPDATE item_links SET is_selected = (id = ?) WHERE item_id = ?")
            .bind(link_id)
            .bind(item_id)
            .execute(&self.pool)
            .await
            .context("Failed to select link")?;
        Ok(())
    }
}

fn row_to_link(row: &SqliteRow) -> ItemLink {
    ItemLink {
        id: row.get("id"),
        url: row.get("url"),
        title: row.get("title"),
        price: row.get("price"),
        is_from_ai: row.get("is_from_ai"),
        is_selected: row.get("is_selected"),
        item_id: row.get("item_id"),
        created_at: row.get("created_at"),
    }
}
