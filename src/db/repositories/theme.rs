//! Theme repository
//!
//! Read-only access to the seeded themes.

use crate::db::Database;
use crate::models::Theme;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

const THEME_COLUMNS: &str = "id, name, color, background, button_color";

/// Theme repository trait
#[async_trait]
pub trait ThemeRepository: Send + Sync {
    /// List all themes ordered by ID
    async fn list(&self) -> Result<Vec<Theme>>;

    /// Get theme by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Theme>>;
}

/// SQLx-based theme repository implementation
pub struct SqlxThemeRepository {
    pool: SqlitePool,
}

impl SqlxThemeRepository {
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub fn boxed(db: Database) -> Arc<dyn ThemeRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl ThemeRepository for SqlxThemeRepository {
    async fn list(&self) -> Result<Vec<Theme>> {
        let sql = format!("SELECT {} FROM themes ORDER BY id", THEME_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list themes")?;

        Ok(rows.iter().map(row_to_theme).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Theme>> {
        let sql = format!("SELECT {} FROM themes WHERE id = ?", THEME_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get theme by ID")?;

        Ok(row.as_ref().map(row_to_theme))
    }
}

fn row_to_theme(row: &SqliteRow) -> Theme {
    Theme {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        background: row.get("background"),
        button_color: row.get("button_color"),
    }
}
