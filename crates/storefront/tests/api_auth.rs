//! Account, login and password reset flows over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{PASSWORD, TestApp};

#[tokio::test]
async fn test_register_then_duplicate_is_conflict() {
    let app = TestApp::new().await;

    let (status, body) = app.register("alice").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["successFlag"], true);
    assert_eq!(body["user"]["name"], "alice");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app.register("alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["successFlag"], false);
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": "bob", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": "bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, body) = app.login("alice", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successFlag"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["expiresIn"], 3600);

    let (status, body) = app.login("alice", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "invalid_credentials");

    let (status, body) = app.login("nobody", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "invalid_credentials");
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let (status, body) = app.request(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, _) = app
        .request(Method::GET, "/api/v1/auth/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::GET, "/api/v1/auth/me", Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alice");
    assert_eq!(body["role"], "user");
}

async fn change_password(app: &TestApp, token: &str, password: &str) -> (StatusCode, Value) {
    app.request(
        Method::POST,
        "/api/v1/auth/change-password",
        Some(token),
        Some(json!({ "newPassword": password })),
    )
    .await
}

#[tokio::test]
async fn test_change_password_rejects_recent_passwords() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let (status, body) = change_password(&app, &token, PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "password_reused");

    let (status, _) = change_password(&app, &token, "Another2@").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = change_password(&app, &token, PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "password_reused");

    let (status, _) = app.login("alice", "Another2@").await;
    assert_eq!(status, StatusCode::OK);
}

async fn forgot(app: &TestApp, name: &str) -> (StatusCode, Value) {
    app.request(
        Method::POST,
        "/api/v1/auth/forgot-password",
        None,
        Some(json!({ "name": name })),
    )
    .await
}

async fn reset(app: &TestApp, token: &str, password: &str) -> (StatusCode, Value) {
    app.request(
        Method::POST,
        "/api/v1/auth/reset-password",
        None,
        Some(json!({ "token": token, "newPassword": password })),
    )
    .await
}

#[tokio::test]
async fn test_reset_flow_second_request_invalidates_first() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, body) = forgot(&app, "alice").await;
    assert_eq!(status, StatusCode::OK);
    let t1 = body["resetToken"].as_str().unwrap().to_string();

    let (_, body) = forgot(&app, "alice").await;
    let t2 = body["resetToken"].as_str().unwrap().to_string();
    assert_ne!(t1, t2);

    let (status, body) = reset(&app, &t1, "Fresh3#pass").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_or_expired_token");

    let (status, body) = reset(&app, &t2, "Fresh3#pass").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successFlag"], true);

    let (status, body) = reset(&app, &t2, "Other4$pass").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_or_expired_token");

    let (status, _) = app.login("alice", "Fresh3#pass").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_rejects_reused_password_and_keeps_token() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (_, body) = forgot(&app, "alice").await;
    let token = body["resetToken"].as_str().unwrap().to_string();

    let (status, body) = reset(&app, &token, PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "password_reused");

    let (status, _) = reset(&app, &token, "Fresh3#pass").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_password_is_uniform_for_unknown_users() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (known_status, known) = forgot(&app, "alice").await;
    let (unknown_status, unknown) = forgot(&app, "nobody").await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known["message"], unknown["message"]);
    assert_eq!(
        known["resetToken"].as_str().unwrap().len(),
        unknown["resetToken"].as_str().unwrap().len()
    );

    // The decoy was never stored.
    let decoy = unknown["resetToken"].as_str().unwrap();
    let (status, body) = reset(&app, decoy, "Fresh3#pass").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_or_expired_token");
}

#[tokio::test]
async fn test_preferences_round_trip() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/v1/user/preferences",
            Some(token.as_str()),
            Some(json!({ "style": "casual", "color": "navy", "size": "M" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preference"]["style"], "casual");

    let (status, body) = app
        .request(Method::GET, "/api/v1/user/preferences", Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preference"]["color"], "navy");
    assert_eq!(body["preference"]["size"], "M");
}
