//! Friend wishlist API endpoints
//!
//! Bookmarks of other people's wishlists:
//! - GET /api/friend-wishlists
//! - POST /api/friend-wishlists
//! - POST /api/friend-wishlists/save-from-url
//! - GET, DELETE /api/friend-wishlists/{id}

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{parse_id, ApiError, ApiJson, AppState, CurrentUser};
use crate::api::responses::{message, success, ItemResponse};
use crate::models::{FriendWishlist, FriendWishlistEntry, Theme};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddFriendRequest {
    pub share_token: String,
    pub friend_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveFromUrlRequest {
    pub share_token: String,
    pub friend_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FriendEntryResponse {
    id: i64,
    wishlist_id: i64,
    friend_name: String,
    title: String,
    description: Option<String>,
    event_date: Option<String>,
    theme: Option<Theme>,
    created_at: DateTime<Utc>,
}

impl From<FriendWishlistEntry> for FriendEntryResponse {
    fn from(entry: FriendWishlistEntry) -> Self {
        let event_date = entry.wishlist.event_date_string();
        Self {
            id: entry.friend.id,
            wishlist_id: entry.friend.wishlist_id,
            friend_name: entry.friend.friend_name,
            title: entry.wishlist.title,
            description: entry.wishlist.description,
            event_date,
            theme: entry.theme,
            created_at: entry.friend.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedFriendResponse {
    id: i64,
    wishlist_id: i64,
    friend_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

impl SavedFriendResponse {
    fn new(friend: FriendWishlist, title: Option<String>) -> Self {
        Self {
            id: friend.id,
            wishlist_id: friend.wishlist_id,
            friend_name: friend.friend_name,
            title,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FriendWishlistView {
    id: i64,
    wishlist_id: i64,
    title: String,
    description: Option<String>,
    event_date: Option<String>,
    theme: Option<Theme>,
    friend_name: String,
    items: Vec<ItemResponse>,
}

#[derive(Debug, Serialize)]
struct ListBody {
    wishlists: Vec<FriendEntryResponse>,
}

#[derive(Debug, Serialize)]
struct AddBody {
    message: &'static str,
    wishlist: SavedFriendResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveFromUrlBody {
    message: &'static str,
    friend_wishlist: SavedFriendResponse,
}

#[derive(Debug, Serialize)]
struct ViewBody {
    wishlist: FriendWishlistView,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_friend_wishlists).post(add_friend_wishlist))
        .route("/save-from-url", post(save_from_url))
        .route(
            "/{id}",
            get(get_friend_wishlist).delete(delete_friend_wishlist),
        )
}

async fn list_friend_wishlists(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let wishlists = state
        .friend_service
        .list(user.id)
        .await?
        .into_iter()
        .map(FriendEntryResponse::from)
        .collect();
    Ok(success(ListBody { wishlists }))
}

async fn add_friend_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<AddFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (friend, wishlist) = state
        .friend_service
        .add(user.id, &body.share_token, &body.friend_name)
        .await?;

    Ok(success(AddBody {
        message: "Wishlist saved",
        wishlist: SavedFriendResponse::new(friend, Some(wishlist.title)),
    }))
}

async fn save_from_url(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<SaveFromUrlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (friend, _) = state
        .friend_service
        .save_from_url(user.id, &body.share_token, body.friend_name.as_deref())
        .await?;

    Ok(success(SaveFromUrlBody {
        message: "Wishlist saved",
        friend_wishlist: SavedFriendResponse::new(friend, None),
    }))
}

/// GET /api/friend-wishlists/{id}
///
/// The saver is not the owner, so reservers are visible.
async fn get_friend_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid friend wishlist ID")?;
    let (friend, details) = state.friend_service.get(id, user.id).await?;
    let event_date = details.wishlist.event_date_string();

    Ok(success(ViewBody {
        wishlist: FriendWishlistView {
            id: details.wishlist.id,
            wishlist_id: friend.wishlist_id,
            title: details.wishlist.title,
            description: details.wishlist.description,
            event_date,
            theme: details.theme,
            friend_name: friend.friend_name,
            items: details
                .items
                .into_iter()
                .map(|entry| ItemResponse::new(entry, true))
                .collect(),
        },
    }))
}

async fn delete_friend_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid friend wishlist ID")?;
    state.friend_service.delete(id, user.id).await?;
    Ok(message("Wishlist removed from friends"))
}
