//! Magic-link login, redemption and token verification

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{authed, json_request, TestApp};

async fn request_link(app: &TestApp, email: &str) -> String {
    let request = Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::HOST, "boards.test")
        .body(Body::from(json!({ "email": email }).to_string()))
        .unwrap();
    let (status, body) = app.call(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Magic link has been sent");
    body["magicLink"].as_str().unwrap().to_string()
}

/// Follow a magic link, returning the redirect location
async fn redeem(app: &TestApp, link: &str) -> (StatusCode, Option<String>) {
    let path = link.trim_start_matches("http://boards.test");
    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::get(path).body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    (response.status(), location)
}

fn query_param<'a>(location: &'a str, key: &str) -> Option<&'a str> {
    location
        .split_once('?')?
        .1
        .split('&')
        .find_map(|pair| pair.strip_prefix(key)?.strip_prefix('='))
}

#[tokio::test]
async fn test_login_returns_link_for_request_host() {
    let app = TestApp::new();
    let link = request_link(&app, "a@example.com").await;
    assert!(link.starts_with("http://boards.test/api/auth/magic-link?token="));
}

#[tokio::test]
async fn test_login_rejects_invalid_email() {
    let app = TestApp::new();
    let (status, body) = app
        .call(json_request("/api/auth/login", None, json!({ "email": "nope" }).to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid email address"));

    let (status, _) = app
        .call(json_request("/api/auth/login", None, "not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_magic_link_redirects_with_session_token() {
    let app = TestApp::new();
    let link = request_link(&app, "a@example.com").await;

    let (status, location) = redeem(&app, &link).await;
    assert_eq!(status, StatusCode::FOUND);
    let location = location.unwrap();
    assert!(location.starts_with("/?token="));
    assert_eq!(query_param(&location, "email"), Some("a%40example.com"));

    let jwt = query_param(&location, "token").unwrap();
    let (status, body) = app
        .call(authed(Request::get("/api/auth/verify"), jwt).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "email": "a@example.com", "status": "valid" }));
}

#[tokio::test]
async fn test_magic_link_is_single_use() {
    let app = TestApp::new();
    let link = request_link(&app, "a@example.com").await;

    assert_eq!(redeem(&app, &link).await.0, StatusCode::FOUND);
    let (status, body) = app
        .call(Request::get(link.trim_start_matches("http://boards.test")).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_magic_link_without_token() {
    let app = TestApp::new();
    let (status, body) = app
        .call(Request::get("/api/auth/magic-link").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing token");
}

#[tokio::test]
async fn test_verify_rejects_bad_credentials() {
    let app = TestApp::new();

    let (status, _) = app
        .call(Request::get("/api/auth/verify").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(authed(Request::get("/api/auth/verify"), "garbage").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let foreign = kanban_sync::backend::auth::TokenService::new(
        "some-other-secret",
        std::time::Duration::from_secs(60),
    )
    .create_token("a@example.com")
    .unwrap();
    let (status, _) = app
        .call(authed(Request::get("/api/auth/verify"), &foreign).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
