//! Wishlist API endpoints
//!
//! Owner routes under /api/wishlists and the public share-token read at
//! /api/public/wishlists/{token}.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{parse_id, ApiError, ApiJson, AppState, CurrentUser, OptionalUser};
use crate::api::responses::{message, success, WishlistResponse};
use crate::models::{CreateWishlistInput, UpdateWishlistInput};

/// Theme used when the client does not pick one
const DEFAULT_THEME_ID: i64 = 1;

/// Body of create and update
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WishlistRequest {
    pub title: String,
    pub description: Option<String>,
    /// `yyyy-MM-dd`
    pub event_date: Option<String>,
    pub theme_id: Option<i64>,
}

impl WishlistRequest {
    fn event_date(&self) -> Result<Option<NaiveDate>, ApiError> {
        parse_event_date(self.event_date.as_deref())
    }
}

fn parse_event_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::bad_request("Invalid event date")),
        None => Ok(None),
    }
}

#[derive(Debug, Serialize)]
struct WishlistListBody {
    wishlists: Vec<WishlistResponse>,
}

#[derive(Debug, Serialize)]
struct WishlistBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    wishlist: WishlistResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicWishlistBody {
    wishlist: WishlistResponse,
    is_owner: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlists).post(create_wishlist))
        .route(
            "/{id}",
            get(get_wishlist).put(update_wishlist).delete(delete_wishlist),
        )
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/{token}", get(get_public_wishlist))
}

async fn list_wishlists(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let wishlists = state
        .wishlist_service
        .list_for_user(user.id)
        .await?
        .into_iter()
        .map(|s| WishlistResponse::new(s.wishlist, s.theme, true).with_item_count(s.item_count))
        .collect();

    Ok(success(WishlistListBody { wishlists }))
}

async fn create_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<WishlistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let event_date = body.event_date()?;
    let wishlist = state
        .wishlist_service
        .create(
            user.id,
            CreateWishlistInput {
                title: body.title,
                description: body.description,
                event_date,
                theme_id: body.theme_id.unwrap_or(DEFAULT_THEME_ID),
            },
        )
        .await?;
    let theme = state.theme_service.find(wishlist.theme_id).await?;

    Ok(success(WishlistBody {
        message: Some("Wishlist created"),
        wishlist: WishlistResponse::new(wishlist, theme, true),
    }))
}

/// GET /api/wishlists/{id}
///
/// Any signed-in user may read by id. Only the owner gets the share token,
/// and the owner never sees who reserved what.
async fn get_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid wishlist ID")?;
    let details = state.wishlist_service.get_details(id).await?;
    let is_owner = details.wishlist.is_owned_by(user.id);

    Ok(success(WishlistBody {
        message: None,
        wishlist: WishlistResponse::details(details, is_owner, !is_owner),
    }))
}

async fn update_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<WishlistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid wishlist ID")?;
    let event_date = body.event_date()?;
    let theme_id = match body.theme_id {
        Some(theme_id) => theme_id,
        None => state.wishlist_service.get(id).await?.theme_id,
    };

    let wishlist = state
        .wishlist_service
        .update(
            id,
            user.id,
            UpdateWishlistInput {
                title: body.title,
                description: body.description,
                event_date,
                theme_id,
            },
        )
        .await?;
    let theme = state.theme_service.find(wishlist.theme_id).await?;

    Ok(success(WishlistBody {
        message: Some("Wishlist updated"),
        wishlist: WishlistResponse::new(wishlist, theme, true),
    }))
}

async fn delete_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid wishlist ID")?;
    state.wishlist_service.delete(id, user.id).await?;
    Ok(message("Wishlist deleted"))
}

/// GET /api/public/wishlists/{token}
///
/// Anonymous readers see whether an item is reserved but not by whom.
async fn get_public_wishlist(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.wishlist_service.get_by_share_token(&token).await?;
    let is_owner = viewer
        .as_ref()
        .is_some_and(|u| details.wishlist.is_owned_by(u.id));
    let show_reserver = viewer.is_some() && !is_owner;

    Ok(success(PublicWishlistBody {
        wishlist: WishlistResponse::details(details, is_owner, show_reserver),
        is_owner,
    }))
}
