//! Item API endpoints
//!
//! - POST /api/items
//! - GET, PUT, DELETE /api/items/{id}
//! - POST /api/items/{id}/reserve and /unreserve
//! - POST /api/items/upload-image (multipart, field `image`)

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{parse_id, ApiError, ApiJson, AppState, CurrentUser};
use crate::api::responses::{message, success, ItemResponse};
use crate::models::{CreateItemInput, LinkInput, UpdateItemInput};
use crate::services::ImageInput;

/// Multipart field carrying the uploaded image
const IMAGE_FIELD: &str = "image";

/// Desire level used when the client sends none
const DEFAULT_DESIRE_LEVEL: i32 = 2;

/// A purchase link as sent by clients
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkRequest {
    pub url: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "isFromAI", alias = "isFromAi")]
    pub is_from_ai: bool,
    pub is_selected: bool,
}

impl From<LinkRequest> for LinkInput {
    fn from(link: LinkRequest) -> Self {
        Self {
            url: link.url,
            title: link.title,
            price: link.price,
            is_from_ai: link.is_from_ai,
            is_selected: link.is_selected,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub wishlist_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// `data:image/...;base64,...`
    pub image_data: Option<String>,
    pub image_url: Option<String>,
    pub desire_level: Option<i32>,
    pub comment: Option<String>,
    pub links: Vec<LinkRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_data: Option<String>,
    pub image_url: Option<String>,
    pub desire_level: Option<i32>,
    pub comment: Option<String>,
    /// Absent keeps the current links, present replaces them
    pub links: Option<Vec<LinkRequest>>,
}

#[derive(Debug, Serialize)]
struct ItemBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    item: ItemResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadBody {
    image_url: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/upload-image", post(upload_image))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/{id}/reserve", post(reserve_item))
        .route("/{id}/unreserve", post(unreserve_item))
}

async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = ImageInput {
        data: body.image_data,
        url: body.image_url,
    };
    let input = CreateItemInput {
        wishlist_id: body.wishlist_id,
        title: body.title,
        description: body.description,
        price: body.price,
        desire_level: body.desire_level.unwrap_or(DEFAULT_DESIRE_LEVEL),
        comment: body.comment,
        links: body.links.into_iter().map(LinkInput::from).collect(),
    };

    let created = state.item_service.create(user.id, input, image).await?;
    Ok(success(ItemBody {
        message: Some("Item added"),
        item: ItemResponse::new(created, false),
    }))
}

async fn get_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid item ID")?;
    let item = state.item_service.get(id, user.id).await?;
    Ok(success(ItemBody {
        message: None,
        item: ItemResponse::new(item, false),
    }))
}

async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid item ID")?;
    let image = ImageInput {
        data: body.image_data,
        url: body.image_url,
    };
    let input = UpdateItemInput {
        title: body.title,
        description: body.description,
        price: body.price,
        desire_level: body.desire_level.unwrap_or(DEFAULT_DESIRE_LEVEL),
        comment: body.comment,
        links: body
            .links
            .map(|links| links.into_iter().map(LinkInput::from).collect()),
    };

    let updated = state.item_service.update(id, user.id, input, image).await?;
    Ok(success(ItemBody {
        message: Some("Item updated"),
        item: ItemResponse::new(updated, false),
    }))
}

async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid item ID")?;
    state.item_service.delete(id, user.id).await?;
    Ok(message("Item deleted"))
}

async fn reserve_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid item ID")?;
    state.item_service.reserve(id, user.id).await?;
    Ok(message("Item reserved"))
}

async fn unreserve_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid item ID")?;
    state.item_service.unreserve(id, user.id).await?;
    Ok(message("Reservation cancelled"))
}

/// POST /api/items/upload-image
///
/// Stores the `image` field and returns its public URL. Other fields are
/// ignored.
async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!("Failed to read multipart: {}", e);
        ApiError::bad_request("Invalid multipart body")
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            tracing::debug!("Failed to read image field: {}", e);
            ApiError::bad_request("Invalid multipart body")
        })?;

        let image_url = state.item_service.upload_image(&data, &content_type).await?;
        return Ok(success(UploadBody { image_url }));
    }

    Err(ApiError::bad_request("No image provided"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let body: CreateItemRequest =
            serde_json::from_str(r#"{"wishlistId":3,"title":"Book"}"#).unwrap();
        assert_eq!(body.wishlist_id, 3);
        assert!(body.links.is_empty());
        assert!(body.desire_level.is_none());
    }

    #[test]
    fn test_link_request_reads_ai_flag() {
        let link: LinkRequest =
            serde_json::from_str(r#"{"url":"https://a.example.com","isFromAI":true}"#).unwrap();
        let input = LinkInput::from(link);
        assert!(input.is_from_ai);
        assert!(!input.is_selected);
    }

    #[test]
    fn test_update_links_absent_vs_empty() {
        let absent: UpdateItemRequest = serde_json::from_str(r#"{"title":"Book"}"#).unwrap();
        assert!(absent.links.is_none());
        let empty: UpdateItemRequest =
            serde_json::from_str(r#"{"title":"Book","links":[]}"#).unwrap();
        assert_eq!(empty.links.map(|l| l.len()), Some(0));
    }
}
