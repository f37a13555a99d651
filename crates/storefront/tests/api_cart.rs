//! Cart aggregation over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::TestApp;

async fn add(app: &TestApp, token: &str, product_id: i32) -> (StatusCode, Value) {
    app.request(
        Method::PUT,
        "/api/v1/cart/add",
        Some(token),
        Some(json!({ "productId": product_id })),
    )
    .await
}

async fn cart(app: &TestApp, token: &str) -> Value {
    let (status, body) = app.request(Method::GET, "/api/v1/cart", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_new_user_has_empty_cart() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let body = cart(&app, &token).await;
    assert_eq!(body["successFlag"], true);
    assert_eq!(body["cartItems"], json!([]));
    assert_eq!(body["totalItem"], 0);
    assert_eq!(body["totalPrice"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_cart_requires_auth() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/v1/cart_items/1",
            None,
            Some(json!({ "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_twice_keeps_one_line() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let (status, first) = add(&app, &token, 1).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["added"], true);

    let (status, second) = add(&app, &token, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["added"], false);
    assert_eq!(first["item"]["id"], second["item"]["id"]);

    let body = cart(&app, &token).await;
    let items = body["cartItems"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 1);
    assert_eq!(items[0]["product"]["ProductName"], "Navy Blue Shirt");
    assert_eq!(body["totalItem"], 1);
    assert_eq!(body["totalPrice"].as_f64(), Some(25.0));
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let (status, body) = add(&app, &token, 404).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_update_reprices_and_totals() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let (_, added) = add(&app, &token, 1).await;
    add(&app, &token, 2).await;
    let item_id = added["item"]["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/cart_items/{item_id}"),
            Some(token.as_str()),
            Some(json!({ "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 3);
    assert_eq!(body["price"].as_f64(), Some(75.0));

    // totalPrice sums captured prices; totalItem sums quantities.
    let body = cart(&app, &token).await;
    assert_eq!(body["totalItem"], 4);
    assert_eq!(body["totalPrice"].as_f64(), Some(115.0));

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/cart_items/{item_id}"),
            Some(token.as_str()),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/cart_items/{item_id}"),
            Some(token.as_str()),
            Some(json!({ "quantity": 100_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");
    assert_eq!(cart(&app, &token).await["totalItem"], 4);
}

#[tokio::test]
async fn test_other_users_items_are_forbidden() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let mallory = app.signed_in("mallory").await;

    let (_, added) = add(&app, &alice, 1).await;
    let uri = format!("/api/v1/cart_items/{}", added["item"]["id"]);

    let (status, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(mallory.as_str()),
            Some(json!({ "quantity": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, _) = app
        .request(Method::DELETE, &uri, Some(mallory.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request(Method::DELETE, &uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request(Method::DELETE, &uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    assert_eq!(cart(&app, &alice).await["cartItems"], json!([]));
}

#[tokio::test]
async fn test_malformed_item_id_is_validation_error() {
    let app = TestApp::new().await;
    let token = app.signed_in("alice").await;

    let (status, body) = app
        .request(Method::DELETE, "/api/v1/cart_items/abc", Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");
}
