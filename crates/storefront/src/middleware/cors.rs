//! CORS policy.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::StorefrontConfig;

/// Build the CORS layer.
///
/// Development allows any origin. Production allows only the configured
/// origin, which config loading guarantees is present and a valid header
/// value; if it somehow isn't, no cross-origin request is allowed.
#[must_use]
pub fn cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let origin = if config.is_production() {
        config
            .allowed_origin
            .as_deref()
            .and_then(|o| HeaderValue::from_str(o).ok())
            .map_or_else(|| AllowOrigin::list(std::iter::empty::<HeaderValue>()), AllowOrigin::exact)
    } else {
        AllowOrigin::from(Any)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
