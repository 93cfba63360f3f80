//! Response payloads shared by the resource handlers
//!
//! Every success body is `{"status":"success", ..payload}`. Field names are
//! camelCase.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{ItemLink, ItemWithLinks, Theme, User, Wishlist, WishlistDetails};

/// Success envelope
#[derive(Debug, Serialize)]
pub struct Success<T> {
    status: &'static str,
    #[serde(flatten)]
    payload: T,
}

/// Wrap `payload` in the success envelope
pub fn success<T: Serialize>(payload: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        payload,
    })
}

/// A bare `{"status":"success","message":..}` body
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub fn message(message: &'static str) -> Json<Success<Message>> {
    success(Message { message })
}

/// Minimal user, returned after register and login
#[derive(Debug, Serialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Profile view of a user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "isFromAI")]
    pub is_from_ai: bool,
    pub is_selected: bool,
}

impl From<ItemLink> for LinkResponse {
    fn from(link: ItemLink) -> Self {
        Self {
            id: link.id,
            url: link.url,
            title: link.title,
            price: link.price,
            is_from_ai: link.is_from_ai,
            is_selected: link.is_selected,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: i64,
    pub wishlist_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub desire_level: i32,
    pub comment: Option<String>,
    pub is_reserved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub links: Vec<LinkResponse>,
}

impl ItemResponse {
    /// `show_reserver` controls whether `reservedByUserId` is exposed.
    /// Owners never see who reserved their gifts.
    pub fn new(entry: ItemWithLinks, show_reserver: bool) -> Self {
        let item = entry.item;
        Self {
            id: item.id,
            wishlist_id: item.wishlist_id,
            title: item.title,
            description: item.description,
            price: item.price,
            image_url: item.image_url,
            desire_level: item.desire_level,
            comment: item.comment,
            is_reserved: item.is_reserved,
            reserved_by_user_id: item.reserved_by_user_id.filter(|_| show_reserver),
            created_at: item.created_at,
            links: entry.links.into_iter().map(LinkResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub theme_id: i64,
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemResponse>>,
}

impl WishlistResponse {
    /// Header fields only. The share token is included for the owner.
    pub fn new(wishlist: Wishlist, theme: Option<Theme>, for_owner: bool) -> Self {
        let event_date = wishlist.event_date_string();
        Self {
            id: wishlist.id,
            title: wishlist.title,
            description: wishlist.description,
            event_date,
            theme_id: wishlist.theme_id,
            theme,
            share_token: for_owner.then_some(wishlist.share_token),
            created_at: wishlist.created_at,
            updated_at: wishlist.updated_at,
            item_count: None,
            items: None,
        }
    }

    pub fn with_item_count(mut self, count: i64) -> Self {
        self.item_count = Some(count);
        self
    }

    /// Full view with items. Reservers are shown only when `show_reserver`.
    pub fn details(details: WishlistDetails, for_owner: bool, show_reserver: bool) -> Self {
        let items = details
            .items
            .into_iter()
            .map(|entry| ItemResponse::new(entry, show_reserver))
            .collect();
        let mut response = Self::new(details.wishlist, details.theme, for_owner);
        response.items = Some(items);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WishlistItem;

    fn entry(reserved_by: Option<i64>) -> ItemWithLinks {
        ItemWithLinks {
            item: WishlistItem {
                id: 1,
                title: "Book".to_string(),
                description: None,
                price: Some(10.0),
                image_url: None,
                desire_level: 2,
                comment: None,
                wishlist_id: 3,
                is_reserved: reserved_by.is_some(),
                reserved_by_user_id: reserved_by,
                created_at: Utc::now(),
            },
            links: vec![ItemLink {
                id: 9,
                url: "https://shop.example.com".to_string(),
                title: None,
                price: None,
                is_from_ai: true,
                is_selected: true,
                item_id: 1,
                created_at: Utc::now(),
            }],
        }
    }

    #[test]
    fn test_success_envelope_flattens_payload() {
        let json = serde_json::to_value(&success(UserRef {
            id: 5,
            username: "alice".to_string(),
        }).0)
        .unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["id"], 5);
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_item_hides_reserver_unless_asked() {
        let hidden = serde_json::to_value(ItemResponse::new(entry(Some(7)), false)).unwrap();
        assert_eq!(hidden["isReserved"], true);
        assert!(hidden.get("reservedByUserId").is_none());

        let shown = serde_json::to_value(ItemResponse::new(entry(Some(7)), true)).unwrap();
        assert_eq!(shown["reservedByUserId"], 7);
    }

    #[test]
    fn test_link_field_names() {
        let json = serde_json::to_value(ItemResponse::new(entry(None), false)).unwrap();
        let link = &json["links"][0];
        assert_eq!(link["isFromAI"], true);
        assert_eq!(link["isSelected"], true);
        assert_eq!(json["desireLevel"], 2);
    }
}
