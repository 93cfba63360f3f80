//! Input validation
//!
//! Field rules shared by the auth, user, wishlist and item services. Each
//! `validate_*` function reports the first failing rule as a
//! `ServiceError::Validation` carrying a user-facing message.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{ServiceError, ServiceResult};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,20}$").expect("valid username regex"));

/// Upper bound for item and link prices
pub const MAX_PRICE: f64 = 9_999_999.99;

/// Maximum wishlists a single user may own
pub const MAX_WISHLISTS_PER_USER: i64 = 50;

/// Maximum items in one wishlist
pub const MAX_ITEMS_PER_WISHLIST: i64 = 100;

/// Maximum purchase links attached to one item
pub const MAX_LINKS_PER_ITEM: usize = 10;

pub fn is_valid_email(email: &str) -> bool {
    !email.trim().is_empty() && EMAIL_RE.is_match(email)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// At least 6 characters with at least one letter and one digit
pub fn is_valid_password(password: &str) -> bool {
    if password.trim().is_empty() || password.chars().count() < 6 {
        return false;
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    has_letter && has_digit
}

/// Absolute http(s) URL with a non-empty host
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    let rest = match url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    !host.is_empty() && !url.chars().any(char::is_whitespace)
}

pub fn is_valid_price(price: Option<f64>) -> bool {
    match price {
        None => true,
        Some(p) => p.is_finite() && (0.0..=MAX_PRICE).contains(&p),
    }
}

pub fn is_valid_desire_level(level: i32) -> bool {
    (1..=3).contains(&level)
}

/// Check registration fields in order: username, email, password, confirmation
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> ServiceResult<()> {
    if !is_valid_username(username) {
        return Err(ServiceError::validation(
            "Username must be 3-20 characters (latin letters, digits, underscores)",
        ));
    }
    if !is_valid_email(email) {
        return Err(ServiceError::validation("Enter a valid email address"));
    }
    if !is_valid_password(password) {
        return Err(ServiceError::validation(
            "Password must be at least 6 characters and include letters and digits",
        ));
    }
    if password != confirm_password {
        return Err(ServiceError::validation("Passwords do not match"));
    }
    Ok(())
}

/// Profile updates reuse the username and email rules
pub fn validate_profile(username: &str, email: &str) -> ServiceResult<()> {
    if !is_valid_username(username) {
        return Err(ServiceError::validation(
            "Username must be 3-20 characters (latin letters, digits, underscores)",
        ));
    }
    if !is_valid_email(email) {
        return Err(ServiceError::validation("Enter a valid email address"));
    }
    Ok(())
}

pub fn validate_wishlist(title: &str, description: Option<&str>) -> ServiceResult<()> {
    let len = title.trim().chars().count();
    if len < 2 {
        return Err(ServiceError::validation(
            "Wishlist title must be at least 2 characters",
        ));
    }
    if title.chars().count() > 100 {
        return Err(ServiceError::validation(
            "Wishlist title must not exceed 100 characters",
        ));
    }
    if description.map_or(false, |d| d.chars().count() > 500) {
        return Err(ServiceError::validation(
            "Description must not exceed 500 characters",
        ));
    }
    Ok(())
}

pub fn validate_item(title: &str, price: Option<f64>, desire_level: i32) -> ServiceResult<()> {
    if title.trim().chars().count() < 2 {
        return Err(ServiceError::validation(
            "Item title must be at least 2 characters",
        ));
    }
    if title.chars().count() > 100 {
        return Err(ServiceError::validation(
            "Item title must not exceed 100 characters",
        ));
    }
    if !is_valid_price(price) {
        return Err(ServiceError::validation(
            "Price must be between 0 and 9,999,999.99",
        ));
    }
    if !is_valid_desire_level(desire_level) {
        return Err(ServiceError::validation(
            "Desire level must be between 1 and 3",
        ));
    }
    Ok(())
}

pub fn validate_link_url(url: &str) -> ServiceResult<()> {
    if is_valid_url(url) {
        Ok(())
    } else {
        Err(ServiceError::validation("Enter a valid link URL"))
    }
}
