//! Database layer
//!
//! WishLister stores everything in SQLite through sqlx. `Database` owns the
//! connection pool, `migrations` builds the schema and `repositories` holds
//! one repository per table.
//!
//! # Usage
//!
//! ```ignore
//! use wishlister::config::DatabaseConfig;
//! use wishlister::db::{create_pool, migrations};
//!
//! let db = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&db).await?;
//! db.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, Database};
