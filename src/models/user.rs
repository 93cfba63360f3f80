//! User model
//!
//! A registered account. Users own wishlists, reserve items on other
//! people's wishlists and bookmark friends' wishlists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub username: String,
    /// Email address (unique, stored lowercased)
    pub email: String,
    /// Login name used to sign in (unique)
    pub login: String,
    /// Password hash (argon2 PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(username: String, email: String, login: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            login,
            password_hash,
            avatar_url: None,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregated counters shown on the profile page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Wishlists owned by the user
    pub wishlists_count: i64,
    /// Items across all of the user's wishlists
    pub items_count: i64,
    /// Items the user has reserved on any wishlist
    pub reserved_items_count: i64,
}
