//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod friend;
pub mod item;
pub mod link;
pub mod session;
pub mod theme;
pub mod user;
pub mod wishlist;

pub use friend::{FriendRepository, SqlxFriendRepository};
pub use item::{ItemRepository, SqlxItemRepository};
pub use link::{LinkRepository, SqlxLinkRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use theme::{SqlxThemeRepository, ThemeRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use wishlist::{SqlxWishlistRepository, WishlistRepository};

/// A write rejected by a UNIQUE constraint.
///
/// Repositories return it inside `anyhow::Error` so services can tell a
/// duplicate apart from other database failures with `downcast_ref`.
#[derive(Debug, thiserror::Error)]
#[error("Unique constraint violated: {0}")]
pub struct UniqueViolation(pub String);

impl UniqueViolation {
    /// Whether the violated constraint covers `column` (`table.column`)
    pub fn involves(&self, column: &str) -> bool {
        self.0.contains(column)
    }
}

/// Turn a failed insert or update into an `anyhow::Error`, keeping unique
/// violations recognisable.
pub(crate) fn write_error(err: sqlx::Error, context: &'static str) -> anyhow::Error {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            UniqueViolation(db.message().to_string()).into()
        }
        other => anyhow::Error::new(other).context(context),
    }
}
