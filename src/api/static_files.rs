//! Static file serving
//!
//! Everything outside /api ends up here:
//! - `/uploads/*` is served from the image storage directory
//! - `/wishlist/{token}` is rewritten to the public view shell `wishlist.html`
//! - other paths resolve under the assets root, falling back to `index.html`

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::api::middleware::AppState;
use crate::services::image_storage::UPLOADS_URL_PREFIX;

const INDEX_FILE: &str = "index.html";
const PUBLIC_VIEW_FILE: &str = "wishlist.html";

/// Serve static files based on path
pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    let decoded_path = urlencoding::decode(path).unwrap_or_else(|_| path.into());
    let path = decoded_path.as_ref();

    if let Some(name) = path.strip_prefix(UPLOADS_URL_PREFIX) {
        return serve_upload(&state.upload_config.path, name).await;
    }

    let root = state.assets_path.as_path();
    if let Some(asset) = asset_path(path) {
        if let Some(response) = read_file(&root.join(&asset)).await {
            return response;
        }
    }

    // SPA shell
    read_file(&root.join(INDEX_FILE))
        .await
        .unwrap_or_else(not_found)
}

/// Map a request path to a file under the assets root.
///
/// Returns `None` for paths that try to leave the root.
pub fn asset_path(path: &str) -> Option<PathBuf> {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        return Some(PathBuf::from(INDEX_FILE));
    }
    if let Some(token) = relative.strip_prefix("wishlist/") {
        if !token.is_empty() {
            return Some(PathBuf::from(PUBLIC_VIEW_FILE));
        }
    }
    if relative.split(['/', '\\']).any(|part| part == "..") {
        return None;
    }
    Some(PathBuf::from(relative))
}

async fn serve_upload(root: &Path, name: &str) -> Response {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return not_found();
    }
    match fs::read(root.join(name)).await {
        Ok(contents) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, get_content_type(name))
            .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
            .body(Body::from(contents))
            .unwrap(),
        Err(_) => not_found(),
    }
}

async fn read_file(path: &Path) -> Option<Response> {
    let metadata = fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    let contents = fs::read(path).await.ok()?;
    Some(build_response(&path.to_string_lossy(), contents))
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    let content_type = get_content_type(path);
    let cache_control = if content_type.starts_with("text/html") {
        "no-cache"
    } else {
        "public, max-age=3600"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(data))
        .unwrap()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": "Not Found" })),
    )
        .into_response()
}

fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path_rewrites() {
        assert_eq!(asset_path("/"), Some(PathBuf::from("index.html")));
        assert_eq!(asset_path("/wishlist/abc-123"), Some(PathBuf::from("wishlist.html")));
        assert_eq!(asset_path("/js/app.js"), Some(PathBuf::from("js/app.js")));
    }

    #[test]
    fn test_asset_path_rejects_traversal() {
        assert_eq!(asset_path("/../config.yml"), None);
        assert_eq!(asset_path("/css/../../secret"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(get_content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(get_content_type("a/b.webp"), "image/webp");
        assert_eq!(get_content_type("noext"), "application/octet-stream");
    }
}
