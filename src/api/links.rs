//! Link API endpoints
//!
//! - GET /api/links/ai/{title} - store search links, no auth
//! - POST /api/links
//! - PUT /api/links/{id}/select
//! - DELETE /api/links/{id}

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{parse_id, ApiError, ApiJson, AppState, CurrentUser};
use crate::api::responses::{message, success, LinkResponse};
use crate::models::LinkInput;
use crate::services::ProductSuggestion;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddLinkRequest {
    pub item_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "isFromAI", alias = "isFromAi")]
    pub is_from_ai: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionResponse {
    url: String,
    title: String,
    source: String,
    #[serde(rename = "isFromAI")]
    is_from_ai: bool,
}

impl From<ProductSuggestion> for SuggestionResponse {
    fn from(s: ProductSuggestion) -> Self {
        Self {
            url: s.url,
            title: s.title,
            source: s.source,
            is_from_ai: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SuggestionsBody {
    links: Vec<SuggestionResponse>,
}

#[derive(Debug, Serialize)]
struct LinkBody {
    message: &'static str,
    link: LinkResponse,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_link))
        .route("/ai/{title}", get(suggest_links))
        .route("/{id}/select", put(select_link))
        .route("/{id}", delete(delete_link))
}

/// GET /api/links/ai/{title}
///
/// The path segment arrives percent-decoded.
async fn suggest_links(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let links = state
        .link_service
        .suggest(&title)
        .await?
        .into_iter()
        .map(SuggestionResponse::from)
        .collect();
    Ok(success(SuggestionsBody { links }))
}

async fn add_link(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<AddLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.item_id <= 0 {
        return Err(ApiError::bad_request("Invalid item ID"));
    }

    let link = state
        .link_service
        .add(
            user.id,
            body.item_id,
            LinkInput {
                url: body.url,
                title: body.title,
                price: body.price,
                is_from_ai: body.is_from_ai,
                is_selected: false,
            },
        )
        .await?;

    Ok(success(LinkBody {
        message: "Link added",
        link: link.into(),
    }))
}

async fn select_link(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid link ID")?;
    let link = state.link_service.select(user.id, id).await?;
    Ok(success(LinkBody {
        message: "Link selected",
        link: link.into(),
    }))
}

async fn delete_link(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid link ID")?;
    state.link_service.delete(user.id, id).await?;
    Ok(message("Link deleted"))
}
