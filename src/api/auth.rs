//! Authentication API endpoints
//!
//! Handles HTTP requests for user authentication:
//! - POST /api/auth/register - Create an account and log it in
//! - POST /api/auth/login - Open a session
//! - POST /api/auth/logout - Close the session and clear the cookie
//!
//! `GET /api/auth/check` is answered by the `auth_check` middleware stage.

use axum::{
    extract::State,
    http::{header, HeaderMap, Uri},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{extract_session_token, ApiError, ApiJson, AppState, SESSION_COOKIE};
use crate::api::responses::{message, success, UserRef};
use crate::services::RegisterInput;

/// Request body for user registration
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub confirm_password: String,
    pub username: String,
    pub email: String,
}

/// Request body for user login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserRef,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// `Set-Cookie` value carrying a session token
pub(crate) fn session_cookie(token: &str, lifetime: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        lifetime.num_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie
pub(crate) fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        SESSION_COOKIE
    )
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state
        .auth_service
        .register(RegisterInput {
            login: body.login,
            password: body.password,
            confirm_password: body.confirm_password,
            username: body.username,
            email: body.email,
        })
        .await?;

    let cookie = session_cookie(&session.id, state.sessions.lifetime());
    Ok((
        [(header::SET_COOKIE, cookie)],
        success(AuthResponse {
            message: "Registration successful",
            user: UserRef::from(&user),
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.auth_service.login(&body.login, &body.password).await?;

    tracing::info!("User {} logged in", user.id);
    let cookie = session_cookie(&session.id, state.sessions.lifetime());
    Ok((
        [(header::SET_COOKIE, cookie)],
        success(AuthResponse {
            message: "Login successful",
            user: UserRef::from(&user),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Always succeeds. A failure to delete the session is only logged.
async fn logout(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers, uri.query()) {
        if let Err(e) = state.auth_service.logout(&token).await {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        message("Logged out"),
    )
}
