//! Friend wishlist model
//!
//! A user's bookmark of someone else's wishlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Wishlist;

/// Friend wishlist entity. Unique per (user_id, wishlist_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendWishlist {
    pub id: i64,
    /// The user who saved the bookmark
    pub user_id: i64,
    /// The bookmarked wishlist (owned by someone else)
    pub wishlist_id: i64,
    /// Name the user gave to the wishlist's owner
    pub friend_name: String,
    pub created_at: DateTime<Utc>,
}

impl FriendWishlist {
    pub fn new(user_id: i64, wishlist_id: i64, friend_name: String) -> Self {
        Self {
            id: 0,
            user_id,
            wishlist_id,
            friend_name,
            created_at: Utc::now(),
        }
    }
}

/// A bookmark together with the wishlist it points to
#[derive(Debug, Clone)]
pub struct FriendWishlistEntry {
    pub friend: FriendWishlist,
    pub wishlist: Wishlist,
    pub theme: Option<super::Theme>,
}
