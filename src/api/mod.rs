//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints of WishLister:
//! - Auth endpoints (register, login, logout; session check in middleware)
//! - Account endpoints (profile, stats)
//! - Wishlist endpoints, including the public share-token read
//! - Item endpoints (CRUD, reservations, image upload)
//! - Link endpoints (CRUD, store search links)
//! - Friend wishlist endpoints
//! - Theme endpoints
//! - Static file serving for the frontend and uploaded images

pub mod auth;
pub mod friends;
pub mod items;
pub mod links;
pub mod middleware;
pub mod responses;
pub mod static_files;
pub mod themes;
pub mod user;
pub mod wishlists;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer};

pub use middleware::{ApiError, AppState, CurrentUser, OptionalUser};

/// Build the /api router
fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", user::router())
        .nest("/wishlists", wishlists::router())
        .nest("/public/wishlists", wishlists::public_router())
        .nest("/items", items::router())
        .nest("/links", links::router())
        .nest("/friend-wishlists", friends::router())
        .nest("/themes", themes::router())
        .fallback(api_not_found)
        .method_not_allowed_fallback(api_not_found)
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("API route not found")
}

/// Build the complete router with middleware.
///
/// Stages, outermost first: request logging, CORS, compression, the
/// `/api/auth/check` interception, panic catching, then routing with the
/// static-file fallback.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS with credentials, for cookie auth from the configured origin
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Ignoring invalid CORS origin: {}", cors_origin),
    }

    // Base64 image payloads are about a third larger than the image itself
    let body_limit = (state.upload_config.max_file_size as usize).saturating_mul(2);

    Router::new()
        .nest("/api", build_api_router())
        .fallback(static_files::serve_static)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_check,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::request_logging))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::repositories::test_support::migrated_pool;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn app() -> (Router, AppState) {
        let state = AppState::new(migrated_pool().await, &Config::default());
        (build_router(state.clone(), "http://localhost:5000"), state)
    }

    #[tokio::test]
    async fn test_auth_check_intercepts_with_bearer() {
        let (router, state) = app().await;
        let (user, session) = state
            .auth_service
            .register(crate::services::RegisterInput {
                login: "alice".to_string(),
                password: "secret1".to_string(),
                confirm_password: "secret1".to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/auth/check")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-authenticated"], "true");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["userId"], user.id);
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json_404() {
        let (router, _) = app().await;
        let response = router
            .oneshot(Request::builder().uri("/api/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "API route not found");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_json_404() {
        let (router, _) = app().await;

        for (method, uri) in [
            (Method::PATCH, "/api/wishlists/1"),
            (Method::GET, "/api/items"),
            (Method::DELETE, "/api/themes"),
        ] {
            let response = router
                .clone()
                .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["message"], "API route not found");
        }
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_credentials() {
        let (router, _) = app().await;
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/wishlists")
                    .header(header::ORIGIN, "http://localhost:5000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
