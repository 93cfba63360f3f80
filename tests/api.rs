//! End-to-end tests over the full router

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use wishlister::api::{build_router, AppState};
use wishlister::config::Config;
use wishlister::db::{create_test_pool, migrations::run_migrations};

// 1x1 transparent PNG
const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

struct TestApp {
    server: TestServer,
    dir: TempDir,
}

async fn setup() -> TestApp {
    let dir = TempDir::new().unwrap();
    let assets = dir.path().join("wwwroot");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("index.html"), "<html>index</html>").unwrap();
    std::fs::write(assets.join("wishlist.html"), "<html>public view</html>").unwrap();
    std::fs::write(assets.join("app.js"), "console.log('hi');").unwrap();

    let mut config = Config::default();
    config.upload.path = dir.path().join("uploads");
    config.assets.path = assets;

    let pool = create_test_pool().await.unwrap();
    run_migrations(&pool).await.unwrap();

    let app = build_router(AppState::new(pool, &config), &config.server.cors_origin);
    TestApp {
        server: TestServer::new(app).unwrap(),
        dir,
    }
}

/// Pull the session token out of a `Set-Cookie` header
fn session_from_set_cookie(value: &HeaderValue) -> String {
    let cookie = value.to_str().unwrap();
    let first = cookie.split(';').next().unwrap();
    first.strip_prefix("session_id=").unwrap().to_string()
}

fn cookie(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::COOKIE,
        HeaderValue::from_str(&format!("session_id={}", token)).unwrap(),
    )
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

fn authed(request: TestRequest, token: &str) -> TestRequest {
    let (name, value) = bearer(token);
    request.add_header(name, value)
}

/// Register `login` and return (token, user id)
async fn register(server: &TestServer, login: &str) -> (String, i64) {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "login": login,
            "password": "secret1",
            "confirmPassword": "secret1",
            "username": login,
            "email": format!("{}@example.com", login),
        }))
        .await;
    response.assert_status_ok();
    let token = session_from_set_cookie(&response.header(header::SET_COOKIE));
    let body: Value = response.json();
    (token, body["user"]["id"].as_i64().unwrap())
}

/// Create a wishlist and return (id, share token)
async fn create_wishlist(server: &TestServer, token: &str, title: &str) -> (i64, String) {
    let response = authed(server.post("/api/wishlists"), token)
        .json(&json!({ "title": title, "themeId": 2, "eventDate": "2026-12-24" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    (
        body["wishlist"]["id"].as_i64().unwrap(),
        body["wishlist"]["shareToken"].as_str().unwrap().to_string(),
    )
}

async fn create_item(server: &TestServer, token: &str, wishlist_id: i64) -> i64 {
    let response = authed(server.post("/api/items"), token)
        .json(&json!({
            "wishlistId": wishlist_id,
            "title": "Headphones",
            "price": 99.5,
            "desireLevel": 3,
            "links": [
                { "url": "https://a.example.com" },
                { "url": "https://b.example.com", "isFromAI": true }
            ]
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["item"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_then_auth_check_with_cookie() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "login": "alice",
            "password": "secret1",
            "confirmPassword": "secret1",
            "username": "Alice",
            "email": "a@x.com",
        }))
        .await;
    response.assert_status_ok();
    let set_cookie = response.header(header::SET_COOKIE);
    assert!(set_cookie.to_str().unwrap().contains("HttpOnly"));
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["user"]["username"], "Alice");
    let user_id = body["user"]["id"].as_i64().unwrap();

    let (name, value) = cookie(&session_from_set_cookie(&set_cookie));
    let check = app.server.get("/api/auth/check").add_header(name, value).await;
    check.assert_status_ok();
    assert_eq!(check.header("x-authenticated"), "true");
    check.assert_json(&json!({
        "authenticated": true,
        "userId": user_id,
        "username": "Alice",
    }));
}

#[tokio::test]
async fn test_auth_check_without_session() {
    let app = setup().await;

    let response = app.server.get("/api/auth/check").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json(&json!({ "authenticated": false }));

    let response = authed(app.server.get("/api/auth/check"), "not-a-session").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_query_parameter() {
    let app = setup().await;
    let (token, _) = register(&app.server, "alice").await;

    let response = app
        .server
        .get("/api/auth/check")
        .add_query_param("session", &token)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_bearer_wins_over_cookie() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (bob, bob_id) = register(&app.server, "bob").await;

    let (name, value) = cookie(&alice);
    let response = authed(app.server.get("/api/auth/check"), &bob)
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["userId"], bob_id);
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let app = setup().await;
    register(&app.server, "alice").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "login": "alice",
            "password": "secret1",
            "confirmPassword": "secret1",
            "username": "alice2",
            "email": "other@example.com",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "login": "carol",
            "password": "secret1",
            "confirmPassword": "different1",
            "username": "carol",
            "email": "carol@example.com",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = setup().await;
    register(&app.server, "alice").await;

    let wrong = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "login": "alice", "password": "wrong1" }))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json::<Value>()["message"], "Invalid login or password");

    let missing = app.server.post("/api/auth/login").json(&json!({})).await;
    missing.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "login": "alice", "password": "secret1" }))
        .await;
    response.assert_status_ok();
    let token = session_from_set_cookie(&response.header(header::SET_COOKIE));

    let logout = authed(app.server.post("/api/auth/logout"), &token).await;
    logout.assert_status_ok();
    assert!(logout
        .header(header::SET_COOKIE)
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    authed(app.server.get("/api/auth/check"), &token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Logging out again is still a success
    app.server.post("/api/auth/logout").await.assert_status_ok();
}

#[tokio::test]
async fn test_other_users_wishlist_is_forbidden() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (bob, _) = register(&app.server, "bob").await;
    let (wishlist_id, _) = create_wishlist(&app.server, &alice, "Birthday").await;

    let response = authed(app.server.put(&format!("/api/wishlists/{}", wishlist_id)), &bob)
        .json(&json!({ "title": "Hijacked", "themeId": 1 }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let delete = authed(app.server.delete(&format!("/api/wishlists/{}", wishlist_id)), &bob).await;
    delete.assert_status(StatusCode::FORBIDDEN);

    let list: Value = authed(app.server.get("/api/wishlists"), &alice).await.json();
    assert_eq!(list["wishlists"][0]["title"], "Birthday");
    assert_eq!(list["wishlists"][0]["theme"]["name"], "Blue");
}

#[tokio::test]
async fn test_wishlist_crud() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;

    let unauthenticated = app.server.get("/api/wishlists").await;
    unauthenticated.assert_status(StatusCode::UNAUTHORIZED);

    let (id, _) = create_wishlist(&app.server, &alice, "Birthday").await;

    let bad_date = authed(app.server.post("/api/wishlists"), &alice)
        .json(&json!({ "title": "Party", "eventDate": "24.12.2026" }))
        .await;
    bad_date.assert_status(StatusCode::BAD_REQUEST);

    let updated = authed(app.server.put(&format!("/api/wishlists/{}", id)), &alice)
        .json(&json!({ "title": "New Year", "themeId": 3 }))
        .await;
    updated.assert_status_ok();
    let body: Value = updated.json();
    assert_eq!(body["wishlist"]["title"], "New Year");
    assert_eq!(body["wishlist"]["themeId"], 3);

    authed(app.server.delete(&format!("/api/wishlists/{}", id)), &alice)
        .await
        .assert_status_ok();
    authed(app.server.get(&format!("/api/wishlists/{}", id)), &alice)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let invalid = authed(app.server.get("/api/wishlists/abc"), &alice).await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json::<Value>()["message"], "Invalid wishlist ID");
}

#[tokio::test]
async fn test_second_reservation_fails() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (bob, _) = register(&app.server, "bob").await;
    let (carol, _) = register(&app.server, "carol").await;
    let (wishlist_id, _) = create_wishlist(&app.server, &alice, "Birthday").await;
    let item_id = create_item(&app.server, &alice, wishlist_id).await;

    authed(app.server.post(&format!("/api/items/{}/reserve", item_id)), &bob)
        .await
        .assert_status_ok();

    let second = authed(app.server.post(&format!("/api/items/{}/reserve", item_id)), &carol).await;
    assert_eq!(second.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(second.json::<Value>()["status"], "error");

    let release = authed(app.server.post(&format!("/api/items/{}/unreserve", item_id)), &carol).await;
    release.assert_status(StatusCode::FORBIDDEN);

    authed(app.server.post(&format!("/api/items/{}/unreserve", item_id)), &bob)
        .await
        .assert_status_ok();
    authed(app.server.post(&format!("/api/items/{}/reserve", item_id)), &carol)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_public_read_hides_reserver() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (bob, bob_id) = register(&app.server, "bob").await;
    let (carol, _) = register(&app.server, "carol").await;
    let (wishlist_id, share_token) = create_wishlist(&app.server, &alice, "Birthday").await;
    let item_id = create_item(&app.server, &alice, wishlist_id).await;
    authed(app.server.post(&format!("/api/items/{}/reserve", item_id)), &bob)
        .await
        .assert_status_ok();

    let url = format!("/api/public/wishlists/{}", share_token);

    let anonymous: Value = app.server.get(&url).await.json();
    assert_eq!(anonymous["isOwner"], false);
    assert_eq!(anonymous["wishlist"]["items"][0]["isReserved"], true);
    assert!(anonymous["wishlist"]["items"][0].get("reservedByUserId").is_none());
    assert!(anonymous["wishlist"].get("shareToken").is_none());

    let friend: Value = authed(app.server.get(&url), &carol).await.json();
    assert_eq!(friend["wishlist"]["items"][0]["reservedByUserId"], bob_id);

    let owner: Value = authed(app.server.get(&url), &alice).await.json();
    assert_eq!(owner["isOwner"], true);
    assert!(owner["wishlist"]["items"][0].get("reservedByUserId").is_none());
    assert_eq!(owner["wishlist"]["shareToken"], share_token.as_str());
    assert_eq!(owner["wishlist"]["theme"]["name"], "Blue");

    app.server
        .get("/api/public/wishlists/no-such-token")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_links_and_selection() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (bob, _) = register(&app.server, "bob").await;
    let (wishlist_id, _) = create_wishlist(&app.server, &alice, "Birthday").await;
    let item_id = create_item(&app.server, &alice, wishlist_id).await;

    let item: Value = authed(app.server.get(&format!("/api/items/{}", item_id)), &alice)
        .await
        .json();
    let links = item["item"]["links"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    let selected: Vec<_> = links.iter().filter(|l| l["isSelected"] == true).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0]["url"], "https://b.example.com");

    authed(app.server.get(&format!("/api/items/{}", item_id)), &bob)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let added = authed(app.server.post("/api/links"), &alice)
        .json(&json!({ "itemId": item_id, "url": "https://c.example.com", "title": "Shop C" }))
        .await;
    added.assert_status_ok();
    let link_id = added.json::<Value>()["link"]["id"].as_i64().unwrap();

    authed(app.server.put(&format!("/api/links/{}/select", link_id)), &bob)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    let selected = authed(app.server.put(&format!("/api/links/{}/select", link_id)), &alice).await;
    selected.assert_status_ok();
    assert_eq!(selected.json::<Value>()["link"]["isSelected"], true);

    authed(app.server.delete(&format!("/api/links/{}", link_id)), &alice)
        .await
        .assert_status_ok();
    authed(app.server.delete(&format!("/api/links/{}", link_id)), &alice)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_search_links_are_public() {
    let app = setup().await;

    let response = app.server.get("/api/links/ai/LEGO%20Technic").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let links = body["links"].as_array().unwrap();
    assert_eq!(links.len(), 5);
    assert!(links.iter().all(|l| l["isFromAI"] == true));
    assert!(links[0]["url"].as_str().unwrap().contains("LEGO%20Technic"));
}

#[tokio::test]
async fn test_item_image_from_data_url_is_served() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (wishlist_id, _) = create_wishlist(&app.server, &alice, "Birthday").await;

    let response = authed(app.server.post("/api/items"), &alice)
        .json(&json!({
            "wishlistId": wishlist_id,
            "title": "Poster",
            "imageData": format!("data:image/png;base64,{}", PNG_BASE64),
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let image_url = body["item"]["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/uploads/"));
    assert!(image_url.ends_with(".png"));

    let image = app.server.get(&image_url).await;
    image.assert_status_ok();
    assert_eq!(image.header(header::CONTENT_TYPE), "image/png");

    let item_id = body["item"]["id"].as_i64().unwrap();
    authed(app.server.delete(&format!("/api/items/{}", item_id)), &alice)
        .await
        .assert_status_ok();
    app.server.get(&image_url).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_multipart_image_upload() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let png = data_encoding::BASE64.decode(PNG_BASE64.as_bytes()).unwrap();

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(png.clone()).file_name("dot.png").mime_type("image/png"),
    );
    let response = authed(app.server.post("/api/items/upload-image"), &alice)
        .multipart(form)
        .await;
    response.assert_status_ok();
    let image_url = response.json::<Value>()["imageUrl"].as_str().unwrap().to_string();
    let name = image_url.trim_start_matches("/uploads/");
    assert!(app.dir.path().join("uploads").join(name).exists());

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(b"plain text".to_vec()).file_name("a.txt").mime_type("text/plain"),
    );
    authed(app.server.post("/api/items/upload-image"), &alice)
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let form = MultipartForm::new().add_part("image", Part::bytes(png).mime_type("image/png"));
    app.server
        .post("/api/items/upload-image")
        .multipart(form)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_friend_wishlists() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (bob, _) = register(&app.server, "bob").await;
    let (carol, _) = register(&app.server, "carol").await;
    let (wishlist_id, share_token) = create_wishlist(&app.server, &alice, "Birthday").await;
    create_item(&app.server, &alice, wishlist_id).await;

    let own = authed(app.server.post("/api/friend-wishlists"), &alice)
        .json(&json!({ "shareToken": share_token, "friendName": "Me" }))
        .await;
    own.assert_status(StatusCode::BAD_REQUEST);

    let unknown = authed(app.server.post("/api/friend-wishlists"), &bob)
        .json(&json!({ "shareToken": "nope", "friendName": "Alice" }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);

    let added = authed(app.server.post("/api/friend-wishlists"), &bob)
        .json(&json!({ "shareToken": share_token, "friendName": "Alice" }))
        .await;
    added.assert_status_ok();
    let friend_id = added.json::<Value>()["wishlist"]["id"].as_i64().unwrap();

    let duplicate = authed(app.server.post("/api/friend-wishlists/save-from-url"), &bob)
        .json(&json!({ "shareToken": share_token }))
        .await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);

    let saved = authed(app.server.post("/api/friend-wishlists/save-from-url"), &carol)
        .json(&json!({ "shareToken": share_token }))
        .await;
    saved.assert_status_ok();
    assert_eq!(saved.json::<Value>()["friendWishlist"]["friendName"], "Friend");

    let list: Value = authed(app.server.get("/api/friend-wishlists"), &bob).await.json();
    assert_eq!(list["wishlists"][0]["friendName"], "Alice");
    assert_eq!(list["wishlists"][0]["title"], "Birthday");

    let view: Value = authed(app.server.get(&format!("/api/friend-wishlists/{}", friend_id)), &bob)
        .await
        .json();
    assert_eq!(view["wishlist"]["items"].as_array().unwrap().len(), 1);

    let stranger = authed(app.server.delete(&format!("/api/friend-wishlists/{}", friend_id)), &carol).await;
    stranger.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(stranger.json::<Value>()["message"], "Friend wishlist not found");

    authed(app.server.delete(&format!("/api/friend-wishlists/{}", friend_id)), &bob)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_wrong_password_keeps_account() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;

    let response = authed(app.server.delete("/api/user/profile"), &alice)
        .json(&json!({ "confirmPassword": "wrong-password1" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    authed(app.server.get("/api/auth/check"), &alice)
        .await
        .assert_status_ok();

    let deleted = authed(app.server.delete("/api/user/profile"), &alice)
        .json(&json!({ "confirmPassword": "secret1" }))
        .await;
    deleted.assert_status_ok();
    authed(app.server.get("/api/auth/check"), &alice)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_and_stats() {
    let app = setup().await;
    let (alice, _) = register(&app.server, "alice").await;
    let (wishlist_id, _) = create_wishlist(&app.server, &alice, "Birthday").await;
    create_item(&app.server, &alice, wishlist_id).await;

    let profile: Value = authed(app.server.get("/api/user/profile"), &alice).await.json();
    assert_eq!(profile["user"]["email"], "alice@example.com");

    let updated = authed(app.server.put("/api/user/profile"), &alice)
        .json(&json!({ "username": "alice_w", "email": "Alice.W@Example.com" }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["user"]["email"], "alice.w@example.com");

    let stats: Value = authed(app.server.get("/api/user/stats"), &alice).await.json();
    assert_eq!(stats["stats"]["wishlistsCount"], 1);
    assert_eq!(stats["stats"]["itemsCount"], 1);
    assert_eq!(stats["stats"]["reservedItemsCount"], 0);
}

#[tokio::test]
async fn test_themes() {
    let app = setup().await;

    let themes: Value = app.server.get("/api/themes").await.json();
    assert_eq!(themes["themes"].as_array().unwrap().len(), 4);

    let theme: Value = app.server.get("/api/themes/4").await.json();
    assert_eq!(theme["theme"]["name"], "Purple");
    assert!(theme["theme"]["buttonColor"].is_string());

    app.server.get("/api/themes/99").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_api_route() {
    let app = setup().await;

    let response = app.server.get("/api/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({ "status": "error", "message": "API route not found" }));
}

#[tokio::test]
async fn test_static_files_and_fallbacks() {
    let app = setup().await;

    let index = app.server.get("/").await;
    index.assert_status_ok();
    index.assert_text("<html>index</html>");

    app.server.get("/app.js").await.assert_text("console.log('hi');");
    app.server
        .get("/wishlist/some-token")
        .await
        .assert_text("<html>public view</html>");
    app.server
        .get("/profile/settings")
        .await
        .assert_text("<html>index</html>");
}

#[tokio::test]
async fn test_static_404_without_shell() {
    let app = setup().await;
    std::fs::remove_file(app.dir.path().join("wwwroot").join("index.html")).unwrap();

    let response = app.server.get("/anything").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["status"], "error");
}
