//! Account API endpoints
//!
//! - GET /api/user/profile
//! - PUT /api/user/profile
//! - DELETE /api/user/profile - requires the password again
//! - GET /api/user/stats

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::clear_session_cookie;
use crate::api::middleware::{ApiError, ApiJson, AppState, CurrentUser};
use crate::api::responses::{message, success, ProfileResponse};
use crate::models::UserStats;
use crate::services::UpdateProfileInput;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
struct ProfileBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    user: ProfileResponse,
}

#[derive(Debug, Serialize)]
struct StatsBody {
    stats: UserStats,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_profile).put(update_profile).delete(delete_account),
        )
        .route("/stats", get(get_stats))
}

async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.get_profile(user.id).await?;
    Ok(success(ProfileBody {
        message: None,
        user: user.into(),
    }))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .user_service
        .update_profile(
            user.id,
            UpdateProfileInput {
                username: body.username,
                email: body.email,
                avatar_url: body.avatar_url,
            },
        )
        .await?;

    Ok(success(ProfileBody {
        message: Some("Profile updated"),
        user: updated.into(),
    }))
}

/// DELETE /api/user/profile
///
/// Sessions, wishlists, items and bookmarks go with the account.
async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<DeleteAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_service
        .delete_account(user.id, &body.confirm_password)
        .await?;

    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        message("Account deleted"),
    ))
}

async fn get_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.user_service.stats(user.id).await?;
    Ok(success(StatsBody { stats }))
}
