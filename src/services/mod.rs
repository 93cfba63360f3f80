//! Services layer - Business logic
//!
//! This module contains the business logic of WishLister.
//! Services are responsible for:
//! - Implementing business rules (validation, limits, ownership)
//! - Coordinating between repositories, the cache and image storage
//! - Mapping failures onto `ServiceError`

pub mod auth;
pub mod error;
pub mod friend;
pub mod image_storage;
pub mod item;
pub mod link;
pub mod password;
pub mod product_search;
pub mod session;
pub mod theme;
pub mod user;
pub mod validation;
pub mod wishlist;

pub use auth::{AuthService, RegisterInput};
pub use error::{ServiceError, ServiceResult};
pub use friend::FriendService;
pub use image_storage::{ImageStorage, LocalImageStorage};
pub use item::{ImageInput, ItemService};
pub use link::LinkService;
pub use password::{hash_password, verify_password};
pub use product_search::{ProductSearch, ProductSuggestion, SmartLinkSearch};
pub use session::SessionManager;
pub use theme::ThemeService;
pub use user::{UpdateProfileInput, UserService};
pub use wishlist::WishlistService;
