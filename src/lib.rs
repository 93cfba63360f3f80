//! WishLister - A gift registry service
//!
//! This library provides the core functionality of WishLister: accounts and
//! sessions, wishlists shared by link, items with purchase links, and
//! reservations that the wishlist owner cannot see.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
