//! Theme model
//!
//! Color schemes a wishlist can be rendered with. Themes are seeded by the
//! migrations and never modified at runtime.

use serde::{Deserialize, Serialize};

/// Theme entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Accent color
    pub color: String,
    /// Page background color
    pub background: String,
    /// Button color
    pub button_color: String,
}
