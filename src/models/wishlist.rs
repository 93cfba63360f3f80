//! Wishlist model
//!
//! A wishlist is owned by exactly one user and is readable by anyone who
//! holds its share token.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Wishlist entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wishlist {
    /// Unique identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Date of the event the wishlist is for
    pub event_date: Option<NaiveDate>,
    /// Theme used to render the wishlist
    pub theme_id: i64,
    /// Owner
    pub user_id: i64,
    /// Unguessable token granting read access. Never regenerated.
    #[serde(skip_serializing)]
    pub share_token: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    /// Create a new wishlist for `user_id`.
    ///
    /// The share token is supplied by the caller so the service controls how
    /// tokens are generated.
    pub fn new(input: CreateWishlistInput, user_id: i64, share_token: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            title: input.title,
            description: input.description,
            event_date: input.event_date,
            theme_id: input.theme_id,
            user_id,
            share_token,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` owns this wishlist
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    /// Event date formatted as `yyyy-MM-dd`
    pub fn event_date_string(&self) -> Option<String> {
        self.event_date.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Input for creating a wishlist
#[derive(Debug, Clone)]
pub struct CreateWishlistInput {
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub theme_id: i64,
}

/// Input for updating a wishlist. All fields are replaced.
#[derive(Debug, Clone)]
pub struct UpdateWishlistInput {
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub theme_id: i64,
}

/// A wishlist listed on its owner's dashboard
#[derive(Debug, Clone)]
pub struct WishlistSummary {
    pub wishlist: Wishlist,
    pub theme: Option<super::Theme>,
    pub item_count: i64,
}

/// A wishlist with its theme and every item, each carrying its links
#[derive(Debug, Clone)]
pub struct WishlistDetails {
    pub wishlist: Wishlist,
    pub theme: Option<super::Theme>,
    pub items: Vec<super::ItemWithLinks>,
}
