//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness
//! GET    /health/ready                         - Readiness (database)
//!
//! # Auth (/api/v1/auth)
//! POST   /api/v1/auth/register                 - Create user + empty cart
//! POST   /api/v1/auth/login                    - Issue bearer credential
//! GET    /api/v1/auth/me                       - Profile (auth)
//! POST   /api/v1/auth/change-password          - Rotate password (auth)
//! POST   /api/v1/auth/forgot-password          - Issue reset token
//! POST   /api/v1/auth/reset-password           - Consume reset token
//!
//! # Cart (auth)
//! GET    /api/v1/cart                          - Cart with totals
//! PUT    /api/v1/cart/add                      - Add product
//! PUT    /api/v1/cart_items/{id}               - Update quantity
//! DELETE /api/v1/cart_items/{id}               - Remove item
//!
//! # Catalog
//! GET    /api/v1/products                      - Search
//! GET    /api/v1/products/{id}                 - Product detail
//! GET    /api/v1/products/recommendation/{id}  - Related products
//!
//! # Preferences (auth)
//! GET    /api/v1/user/preferences
//! PUT    /api/v1/user/preferences
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod preferences;
pub mod products;

use axum::{
    Json, Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::request_id::make_request_span;
use crate::middleware::{
    auth_rate_limiter, cors_layer, rate_limited_response, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Success envelope: `{"successFlag": true, ...data}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Success<T> {
    success_flag: bool,
    #[serde(flatten)]
    data: T,
}

/// Wrap `data` in the success envelope.
pub const fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success_flag: true,
        data,
    })
}

/// Create the auth routes router.
///
/// Unauthenticated credential endpoints are rate limited per client IP
/// when `limit` is set.
pub fn auth_routes(limit: bool) -> Router<AppState> {
    let mut public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password));

    if limit {
        match auth_rate_limiter() {
            Some(limiter) => {
                public = public
                    .layer(limiter)
                    .layer(axum_middleware::map_response(rate_limited_response));
            }
            None => tracing::warn!("auth rate limiter unavailable; continuing without it"),
        }
    }

    Router::new()
        .route("/me", get(auth::me))
        .route("/change-password", post(auth::change_password))
        .merge(public)
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/add", put(cart::add))
        .route(
            "/cart_items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/recommendation/{id}", get(products::recommendations))
}

/// Create all `/api/v1` routes.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.config().auth_rate_limit))
        .merge(cart_routes())
        .nest("/products", product_routes())
        .route(
            "/user/preferences",
            get(preferences::show).put(preferences::update),
        )
}

async fn not_found() -> AppError {
    AppError::NotFound("Route".to_string())
}

/// Build the complete application with middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_routes(&state))
        .fallback(not_found)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(cors_layer(state.config()))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
