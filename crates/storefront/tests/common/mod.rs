//! Shared helpers for router-level tests.
//!
//! Builds the full application over in-memory stores and a stub
//! recommendation gateway, then drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code, clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use fitroom_core::ProductId;
use fitroom_storefront::config::{
    Environment, PasswordHashingConfig, RecommendationConfig, StorefrontConfig,
};
use fitroom_storefront::db::Stores;
use fitroom_storefront::models::{Product, ProductDescription, Ratings};
use fitroom_storefront::routes;
use fitroom_storefront::services::recommendation::{GatewayError, RecommendationGateway};
use fitroom_storefront::state::AppState;

pub const PASSWORD: &str = "Secret1!";

/// Gateway that answers every lookup with the same ids.
pub struct StubGateway {
    pub ids: Vec<ProductId>,
    pub fail: bool,
}

#[async_trait]
impl RecommendationGateway for StubGateway {
    async fn related(&self, _product_name: &str) -> Result<Vec<ProductId>, GatewayError> {
        if self.fail {
            return Err(GatewayError::InvalidBaseUrl(
                Url::parse("data:text/plain,down").unwrap(),
            ));
        }
        Ok(self.ids.clone())
    }
}

pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused@localhost/fitroom"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 5000,
        environment: Environment::Development,
        allowed_origin: None,
        jwt_secret: SecretString::from("kX9#mQ2$vL7@pR4!nT8&wZ3*bF6^hJ1%"),
        token_ttl: Duration::from_secs(3600),
        auth_rate_limit: false,
        password_hashing: PasswordHashingConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        recommendation: RecommendationConfig {
            base_url: Url::parse("http://127.0.0.1:8000/").unwrap(),
            timeout: Duration::from_secs(10),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

pub fn product(id: i32, name: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: ProductDescription {
            brand: Some("Roadster".to_string()),
            size: Some("M".to_string()),
            color: Some("Navy Blue".to_string()),
            short_description: None,
        },
        gender: Some("Men".to_string()),
        season: Some("Summer".to_string()),
        usage: Some("Casual".to_string()),
        cost: Decimal::new(cents, 2),
        ratings: Ratings {
            avg_rating: 4.2,
            total_ratings: 10,
        },
        image: None,
    }
}

/// A running application plus a handle on its state.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    /// App with products 1..=3 and a gateway recommending `[3, 99, 2]`.
    pub async fn new() -> Self {
        Self::with_gateway(StubGateway {
            ids: [3, 99, 2].map(ProductId::new).to_vec(),
            fail: false,
        })
        .await
    }

    pub async fn with_gateway(gateway: StubGateway) -> Self {
        let stores = Stores::in_memory();
        for (id, name, cents) in [
            (1, "Navy Blue Shirt", 2500),
            (2, "Black Jeans", 4000),
            (3, "White Sneakers", 6000),
        ] {
            stores.products.upsert(&product(id, name, cents)).await.unwrap();
        }

        let state = AppState::new(test_config(), stores, Arc::new(gateway)).unwrap();
        let router = routes::app(state.clone());
        Self { state, router }
    }

    /// Send a request and return status plus parsed JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn register(&self, name: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(serde_json::json!({ "name": name, "password": PASSWORD })),
        )
        .await
    }

    pub async fn login(&self, name: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(serde_json::json!({ "name": name, "password": password })),
        )
        .await
    }

    /// Register `name` and return a bearer token for it.
    pub async fn signed_in(&self, name: &str) -> String {
        let (status, _) = self.register(name).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(name, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}
