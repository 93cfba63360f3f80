//! Item link model
//!
//! Purchase links attached to an item. At most one link per item is
//! marked as selected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Item link entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLink {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    /// Link was generated by the product search rather than typed in
    pub is_from_ai: bool,
    /// Primary link shown for the item
    pub is_selected: bool,
    pub item_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A link to attach to an item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkInput {
    pub url: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub is_from_ai: bool,
    pub is_selected: bool,
}

impl LinkInput {
    /// Create a plain, user-supplied link
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}
