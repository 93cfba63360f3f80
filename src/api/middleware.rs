//! API middleware
//!
//! Contains:
//! - `AppState`, the service graph shared by every handler
//! - `ApiError`, the `{"status":"error","message":..}` envelope
//! - Session token extraction and the `CurrentUser` / `OptionalUser` extractors
//! - Pipeline stages: request logging, `/api/auth/check` interception and
//!   the panic handler

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::create_cache;
use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    SqlxFriendRepository, SqlxItemRepository, SqlxLinkRepository, SqlxSessionRepository,
    SqlxThemeRepository, SqlxUserRepository, SqlxWishlistRepository,
};
use crate::db::Database;
use crate::models::User;
use crate::services::{
    AuthService, FriendService, ImageStorage, ItemService, LinkService, LocalImageStorage,
    ServiceError, SessionManager, SmartLinkSearch, ThemeService, UserService, WishlistService,
};

/// Path answered by the auth-check stage
pub const AUTH_CHECK_PATH: &str = "/api/auth/check";

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_id";

/// Query parameter carrying the session token
pub const SESSION_QUERY_PARAM: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub wishlist_service: Arc<WishlistService>,
    pub item_service: Arc<ItemService>,
    pub link_service: Arc<LinkService>,
    pub friend_service: Arc<FriendService>,
    pub theme_service: Arc<ThemeService>,
    pub upload_config: Arc<UploadConfig>,
    pub assets_path: Arc<PathBuf>,
}

impl AppState {
    /// Wire repositories, cache, storage and services over one pool
    pub fn new(pool: Database, config: &Config) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let theme_repo = SqlxThemeRepository::boxed(pool.clone());
        let wishlist_repo = SqlxWishlistRepository::boxed(pool.clone());
        let item_repo = SqlxItemRepository::boxed(pool.clone());
        let link_repo = SqlxLinkRepository::boxed(pool.clone());
        let friend_repo = SqlxFriendRepository::boxed(pool);

        let cache = create_cache(&config.cache);
        let images: Arc<dyn ImageStorage> =
            Arc::new(LocalImageStorage::new(config.upload.clone()));

        let sessions = Arc::new(SessionManager::with_lifetime_days(
            session_repo,
            user_repo.clone(),
            config.session.lifetime_days,
        ));
        let theme_service = Arc::new(ThemeService::new(theme_repo, cache));
        let wishlist_service = Arc::new(WishlistService::new(
            wishlist_repo.clone(),
            item_repo.clone(),
            link_repo.clone(),
            theme_service.clone(),
            images.clone(),
        ));
        let item_service = Arc::new(ItemService::new(
            item_repo.clone(),
            link_repo.clone(),
            wishlist_repo.clone(),
            images.clone(),
        ));

        Self {
            auth_service: Arc::new(AuthService::new(user_repo.clone(), sessions.clone())),
            user_service: Arc::new(UserService::new(
                user_repo,
                wishlist_repo.clone(),
                item_repo,
                images,
            )),
            link_service: Arc::new(LinkService::new(
                link_repo,
                item_service.clone(),
                Arc::new(SmartLinkSearch::new()),
            )),
            friend_service: Arc::new(FriendService::new(
                friend_repo,
                wishlist_repo,
                wishlist_service.clone(),
            )),
            sessions,
            wishlist_service,
            item_service,
            theme_service,
            upload_config: Arc::new(config.upload.clone()),
            assets_path: Arc::new(config.assets.path.clone()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::bad_request(message),
            ServiceError::Unauthorized(message) => Self::unauthorized(message),
            ServiceError::Forbidden(message) => Self::forbidden(message),
            ServiceError::NotFound(message) => Self::not_found(message),
            ServiceError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                Self::internal_error()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::bad_request("Invalid request body")
    }
}

/// JSON body extractor whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Parse a numeric path segment, answering 400 with `message` otherwise
pub fn parse_id(raw: &str, message: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(message))
}

// ============================================================================
// Authentication
// ============================================================================

/// Extract the session token from a request.
///
/// Sources are checked in order: `Authorization: Bearer`, the `session_id`
/// cookie, then the `session` query parameter. The first non-empty token wins.
pub fn extract_session_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    bearer_token(headers)
        .or_else(|| cookie_token(headers))
        .or_else(|| query.and_then(query_token))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| key.trim() == SESSION_COOKIE && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}

fn query_token(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| *key == SESSION_QUERY_PARAM && !value.is_empty())
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(token) = extract_session_token(&parts.headers, parts.uri.query()) else {
        return Ok(None);
    };
    Ok(state.sessions.authenticate(&token).await?)
}

/// The authenticated caller. Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// The caller, if the request carries a valid session
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(resolve_user(parts, state).await?))
    }
}

// ============================================================================
// Pipeline stages
// ============================================================================

/// Answer `/api/auth/check` without reaching the router
pub async fn auth_check(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.uri().path() != AUTH_CHECK_PATH {
        return next.run(request).await;
    }

    let user = match extract_session_token(request.headers(), request.uri().query()) {
        Some(token) => match state.sessions.authenticate(&token).await {
            Ok(user) => user,
            Err(e) => return ApiError::from(e).into_response(),
        },
        None => None,
    };

    match user {
        Some(user) => (
            [(
                HeaderName::from_static("x-authenticated"),
                HeaderValue::from_static("true"),
            )],
            Json(json!({
                "authenticated": true,
                "userId": user.id,
                "username": user.username,
            })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response(),
    }
}

/// Log one line per request
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = redact_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Hide share tokens from logged paths
pub fn redact_path(path: &str) -> String {
    for prefix in ["/api/public/wishlists/", "/wishlist/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if !rest.is_empty() {
                return format!("{}***", prefix);
            }
        }
    }
    path.to_string()
}

/// Response for a handler that panicked
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!("Handler panicked: {}", detail);
    ApiError::internal_error().into_response()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer test-token-123")]);
        assert_eq!(extract_session_token(&map, None), Some("test-token-123".to_string()));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let map = headers(&[(header::AUTHORIZATION, "bEaReR abc")]);
        assert_eq!(extract_session_token(&map, None), Some("abc".to_string()));
    }

    #[test]
    fn test_non_bearer_authorization_is_ignored() {
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_session_token(&map, None), None);
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark;  session_id = tok-1 ; other=x")]);
        assert_eq!(extract_session_token(&map, None), Some("tok-1".to_string()));
    }

    #[test]
    fn test_cookie_value_may_contain_equals() {
        let map = headers(&[(header::COOKIE, "session_id=abc==")]);
        assert_eq!(extract_session_token(&map, None), Some("abc==".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_query() {
        let map = HeaderMap::new();
        assert_eq!(
            extract_session_token(&map, Some("page=2&session=tok%2D9")),
            Some("tok-9".to_string())
        );
    }

    #[test]
    fn test_bearer_wins_over_cookie_and_query() {
        let map = headers(&[
            (header::COOKIE, "session_id=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(
            extract_session_token(&map, Some("session=from-query")),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn test_cookie_wins_over_query() {
        let map = headers(&[(header::COOKIE, "session_id=from-cookie")]);
        assert_eq!(
            extract_session_token(&map, Some("session=from-query")),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn test_no_token() {
        let map = headers(&[(header::COOKIE, "session=legacy")]);
        assert_eq!(extract_session_token(&map, Some("sessionx=1")), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "Invalid item ID").unwrap(), 42);
        let err = parse_id("abc", "Invalid item ID").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid item ID");
        assert!(parse_id("-1", "Invalid item ID").is_err());
    }

    #[test]
    fn test_service_error_mapping() {
        let cases = [
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::unauthorized("who"), StatusCode::UNAUTHORIZED),
            (ServiceError::forbidden("no"), StatusCode::FORBIDDEN),
            (ServiceError::not_found("gone"), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = ApiError::from(ServiceError::Internal(anyhow::anyhow!("disk on fire")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_redact_path() {
        assert_eq!(redact_path("/api/public/wishlists/abc-123"), "/api/public/wishlists/***");
        assert_eq!(redact_path("/wishlist/abc-123"), "/wishlist/***");
        assert_eq!(redact_path("/api/wishlists/5"), "/api/wishlists/5");
        assert_eq!(redact_path("/wishlist/"), "/wishlist/");
    }

    #[test]
    fn test_panic_response_is_generic() {
        let response = panic_response(Box::new("boom".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
