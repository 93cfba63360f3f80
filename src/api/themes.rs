//! Theme API endpoints
//!
//! - GET /api/themes
//! - GET /api/themes/{id}

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::api::middleware::{parse_id, ApiError, AppState};
use crate::api::responses::success;
use crate::models::Theme;

#[derive(Debug, Serialize)]
struct ThemesBody {
    themes: Vec<Theme>,
}

#[derive(Debug, Serialize)]
struct ThemeBody {
    theme: Theme,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_themes))
        .route("/{id}", get(get_theme))
}

async fn list_themes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let themes = state.theme_service.list().await?;
    Ok(success(ThemesBody { themes }))
}

async fn get_theme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Invalid theme ID")?;
    let theme = state.theme_service.get(id).await?;
    Ok(success(ThemeBody { theme }))
}
