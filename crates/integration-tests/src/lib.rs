//! Live-server integration tests for Fitroom.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database, migrate and seed the catalog
//! cargo run -p fitroom-cli -- migrate
//! cargo run -p fitroom-cli -- seed products data/products.json
//!
//! # Start the storefront with auth rate limiting off
//! STOREFRONT_AUTH_RATE_LIMIT=false cargo run -p fitroom-storefront
//!
//! # Run the ignored tests against it
//! cargo test -p fitroom-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` overrides the default `http://localhost:5000`.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every account these tests create.
pub const PASSWORD: &str = "Integration1!";

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// A user name no earlier run has taken.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// Thin JSON client for the storefront API.
pub struct StorefrontApi {
    client: Client,
    base_url: String,
}

impl Default for StorefrontApi {
    fn default() -> Self {
        Self::new()
    }
}

impl StorefrontApi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: storefront_base_url(),
        }
    }

    /// Send a request under `/api/v1` and return status plus JSON body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self
            .client
            .request(method, format!("{}/api/v1{path}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.expect("storefront is not reachable");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Register `name` with [`PASSWORD`].
    pub async fn register(&self, name: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": name, "password": PASSWORD })),
        )
        .await
    }

    pub async fn login(&self, name: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "name": name, "password": password })),
        )
        .await
    }

    /// Register a fresh user and return `(name, bearer token)`.
    pub async fn signed_in_user(&self, prefix: &str) -> (String, String) {
        let name = unique_name(prefix);
        let (status, _) = self.register(&name).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(&name, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().expect("login returns a token");
        (name, token.to_string())
    }

    /// First product in the seeded catalog.
    pub async fn any_product_id(&self) -> i64 {
        let (status, body) = self.send(Method::GET, "/products?limit=1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        body["products"][0]["productID"]
            .as_i64()
            .expect("catalog is seeded")
    }
}
