//! Wishlist item model
//!
//! An item belongs to exactly one wishlist. Its reservation fields only
//! change through the conditional reserve/unreserve updates in the item
//! repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ItemLink, LinkInput};

/// Wishlist item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    /// How much the item is wanted, 1 to 3
    pub desire_level: i32,
    pub comment: Option<String>,
    pub wishlist_id: i64,
    pub is_reserved: bool,
    pub reserved_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Reservation state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    Unreserved,
    Reserved { by: i64 },
}

impl WishlistItem {
    pub fn new(input: &CreateItemInput, image_url: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            price: input.price,
            image_url,
            desire_level: input.desire_level,
            comment: input.comment.clone(),
            wishlist_id: input.wishlist_id,
            is_reserved: false,
            reserved_by_user_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn reservation(&self) -> ReservationState {
        match (self.is_reserved, self.reserved_by_user_id) {
            (true, Some(by)) => ReservationState::Reserved { by },
            _ => ReservationState::Unreserved,
        }
    }

    /// Whether `user_id` is the one holding the reservation
    pub fn is_reserved_by(&self, user_id: i64) -> bool {
        self.reservation() == ReservationState::Reserved { by: user_id }
    }
}

/// An item together with its purchase links
#[derive(Debug, Clone)]
pub struct ItemWithLinks {
    pub item: WishlistItem,
    pub links: Vec<ItemLink>,
}

/// Input for creating an item
#[derive(Debug, Clone, Default)]
pub struct CreateItemInput {
    pub wishlist_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub desire_level: i32,
    pub comment: Option<String>,
    pub links: Vec<LinkInput>,
}

/// Input for updating an item
///
/// `links: None` keeps the existing links, `Some(..)` replaces them.
#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub desire_level: i32,
    pub comment: Option<String>,
    pub links: Option<Vec<LinkInput>>,
}
