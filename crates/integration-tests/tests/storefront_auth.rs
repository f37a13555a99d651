//! Integration tests for storefront accounts and password resets.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The storefront server running (cargo run -p fitroom-storefront)
//!
//! Run with: cargo test -p fitroom-integration-tests -- --ignored

#![allow(clippy::expect_used, clippy::indexing_slicing)]

use reqwest::{Method, StatusCode};
use serde_json::json;

use fitroom_integration_tests::{PASSWORD, StorefrontApi, storefront_base_url, unique_name};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = reqwest::get(format!("{}/health/ready", storefront_base_url()))
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_login_and_conflict() {
    let api = StorefrontApi::new();
    let name = unique_name("alice");

    let (status, body) = api.register(&name).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["successFlag"], true);

    let (status, body) = api.register(&name).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let (status, body) = api.login(&name, "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "invalid_credentials");

    let (status, body) = api.login(&name, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token");

    let (status, body) = api.send(Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], name.as_str());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_password_history_blocks_reuse() {
    let api = StorefrontApi::new();
    let (_, token) = api.signed_in_user("history").await;

    let change = |password: &str| {
        json!({ "newPassword": password })
    };

    for password in ["Rotate1!aa", "Rotate2!bb"] {
        let (status, _) = api
            .send(
                Method::POST,
                "/auth/change-password",
                Some(token.as_str()),
                Some(change(password)),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    for reused in [PASSWORD, "Rotate1!aa", "Rotate2!bb"] {
        let (status, body) = api
            .send(
                Method::POST,
                "/auth/change-password",
                Some(token.as_str()),
                Some(change(reused)),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{reused}");
        assert_eq!(body["kind"], "password_reused");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_reset_tokens_are_single_use_and_replaced() {
    let api = StorefrontApi::new();
    let (name, _) = api.signed_in_user("reset").await;

    let forgot = json!({ "name": name });
    let (_, first) = api
        .send(Method::POST, "/auth/forgot-password", None, Some(forgot.clone()))
        .await;
    let (_, second) = api
        .send(Method::POST, "/auth/forgot-password", None, Some(forgot))
        .await;
    let t1 = first["resetToken"].as_str().expect("token");
    let t2 = second["resetToken"].as_str().expect("token");

    let reset = |token: &str| {
        json!({ "token": token, "newPassword": "Recovered9#" })
    };

    let (status, body) = api
        .send(Method::POST, "/auth/reset-password", None, Some(reset(t1)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_or_expired_token");

    let (status, _) = api
        .send(Method::POST, "/auth/reset-password", None, Some(reset(t2)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = api
        .send(Method::POST, "/auth/reset-password", None, Some(reset(t2)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_or_expired_token");

    let (status, _) = api.login(&name, "Recovered9#").await;
    assert_eq!(status, StatusCode::OK);
}
