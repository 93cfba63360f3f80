//! Data models
//!
//! This module contains the data structures used throughout WishLister:
//! - Database entities (User, Session, Theme, Wishlist, WishlistItem, ItemLink, FriendWishlist)
//! - Service-level input types
//! - Aggregates returned by services (summaries, items with links)

mod friend_wishlist;
mod item;
mod item_link;
mod session;
mod theme;
mod user;
mod wishlist;

pub use friend_wishlist::{FriendWishlist, FriendWishlistEntry};
pub use item::{CreateItemInput, ItemWithLinks, ReservationState, UpdateItemInput, WishlistItem};
pub use item_link::{ItemLink, LinkInput};
pub use session::Session;
pub use theme::Theme;
pub use user::{User, UserStats};
pub use wishlist::{
    CreateWishlistInput, UpdateWishlistInput, Wishlist, WishlistDetails, WishlistSummary,
};
