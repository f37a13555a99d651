//! Integration tests for the storefront cart.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database with a seeded catalog
//! - The storefront server running (cargo run -p fitroom-storefront)
//!
//! Run with: cargo test -p fitroom-integration-tests -- --ignored

#![allow(clippy::expect_used, clippy::indexing_slicing)]

use reqwest::{Method, StatusCode};
use serde_json::json;

use fitroom_integration_tests::StorefrontApi;

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_add_is_idempotent() {
    let api = StorefrontApi::new();
    let (_, token) = api.signed_in_user("cart").await;
    let product_id = api.any_product_id().await;

    for _ in 0..2 {
        let (status, _) = api
            .send(
                Method::PUT,
                "/cart/add",
                Some(token.as_str()),
                Some(json!({ "productId": product_id })),
            )
            .await;
        assert!(status.is_success());
    }

    let (status, body) = api.send(Method::GET, "/cart", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["cartItems"].as_array().expect("cartItems");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 1);
    assert_eq!(body["totalItem"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_items_are_owned() {
    let api = StorefrontApi::new();
    let (_, owner) = api.signed_in_user("owner").await;
    let (_, other) = api.signed_in_user("other").await;
    let product_id = api.any_product_id().await;

    let (_, body) = api
        .send(
            Method::PUT,
            "/cart/add",
            Some(owner.as_str()),
            Some(json!({ "productId": product_id })),
        )
        .await;
    let path = format!("/cart_items/{}", body["item"]["id"]);

    let (status, body) = api
        .send(Method::PUT, &path, Some(other.as_str()), Some(json!({ "quantity": 2 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, body) = api
        .send(Method::PUT, &path, Some(owner.as_str()), Some(json!({ "quantity": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 2);

    let (status, _) = api.send(Method::DELETE, &path, Some(owner.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
}
