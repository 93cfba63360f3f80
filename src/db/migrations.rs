//! Database migrations module
//!
//! Code-based schema migrations for WishLister. Every migration is embedded
//! in the binary, applied inside its own transaction and recorded in the
//! `_migrations` table.
//!
//! # Usage
//!
//! ```ignore
//! use wishlister::db::{create_pool, migrations};
//!
//! let db = create_pool(&config).await?;
//! migrations::run_migrations(&db).await?;
//! ```

use anyhow::{Context, Result};
use sqlx::Row;

use super::Database;

/// A schema migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements, separated by `;`
    pub sql: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        sql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                login VARCHAR(50) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                avatar_url TEXT,
                phone VARCHAR(32),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        sql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_themes",
        sql: r#"
            CREATE TABLE IF NOT EXISTS themes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(50) NOT NULL,
                color VARCHAR(20) NOT NULL,
                background VARCHAR(20) NOT NULL,
                button_color VARCHAR(20) NOT NULL
            );
            INSERT OR IGNORE INTO themes (id, name, color, background, button_color) VALUES
                (1, 'Pink', '#ff69b4', '#fff0f5', '#ff1493'),
                (2, 'Blue', '#1e90ff', '#f0f8ff', '#0000ff'),
                (3, 'Green', '#32cd32', '#f0fff0', '#008000'),
                (4, 'Purple', '#8a2be2', '#f8f0ff', '#9400d3');
        "#,
    },
    Migration {
        version: 4,
        name: "create_wishlists",
        sql: r#"
            CREATE TABLE IF NOT EXISTS wishlists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(100) NOT NULL,
                description TEXT,
                event_date DATE,
                theme_id INTEGER NOT NULL DEFAULT 1,
                user_id INTEGER NOT NULL,
                share_token VARCHAR(64) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (theme_id) REFERENCES themes(id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_wishlists_user_id ON wishlists(user_id);
        "#,
    },
    Migration {
        version: 5,
        name: "create_wishlist_items",
        sql: r#"
            CREATE TABLE IF NOT EXISTS wishlist_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(100) NOT NULL,
                description TEXT,
                price REAL,
                image_url TEXT,
                desire_level INTEGER NOT NULL DEFAULT 1 CHECK (desire_level BETWEEN 1 AND 3),
                comment TEXT,
                wishlist_id INTEGER NOT NULL,
                is_reserved BOOLEAN NOT NULL DEFAULT 0,
                reserved_by_user_id INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (wishlist_id) REFERENCES wishlists(id) ON DELETE CASCADE,
                FOREIGN KEY (reserved_by_user_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_wishlist_items_wishlist_id ON wishlist_items(wishlist_id);
            CREATE INDEX IF NOT EXISTS idx_wishlist_items_reserved_by ON wishlist_items(reserved_by_user_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_item_links",
        sql: r#"
            CREATE TABLE IF NOT EXISTS item_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                title VARCHAR(255),
                price REAL,
                is_from_ai BOOLEAN NOT NULL DEFAULT 0,
                is_selected BOOLEAN NOT NULL DEFAULT 0,
                item_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (item_id) REFERENCES wishlist_items(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_item_links_item_id ON item_links(item_id);
        "#,
    },
    Migration {
        version: 7,
        name: "create_friend_wishlists",
        sql: r#"
            CREATE TABLE IF NOT EXISTS friend_wishlists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                wishlist_id INTEGER NOT NULL,
                friend_name VARCHAR(100) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (user_id, wishlist_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (wishlist_id) REFERENCES wishlists(id) ON DELETE CASCADE
            );
        "#,
    },
];

/// Run all pending migrations in version order.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(db: &Database) -> Result<usize> {
    create_migrations_table(db).await?;

    let applied = applied_versions(db).await?;
    let mut count = 0;

    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.name
        );
        apply_migration(db, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(db: &Database) -> Result<()> {
    db.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;
    Ok(())
}

async fn applied_versions(db: &Database) -> Result<Vec<i32>> {
    let rows = sqlx::query("SELECT version FROM _migrations ORDER BY version")
        .fetch_all(db.pool())
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows.iter().map(|row| row.get::<i64, _>("version") as i32).collect())
}

/// Apply one migration and record it, all or nothing
async fn apply_migration(db: &Database, migration: &Migration) -> Result<()> {
    let mut tx = db.pool().begin().await.context("Failed to begin migration")?;

    for statement in split_sql_statements(migration.sql) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await
        .context("Failed to record migration")?;

    tx.commit().await.context("Failed to commit migration")?;
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a migration into trimmed, non-empty statements.
///
/// Fragments made only of `--` comments are dropped.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}
