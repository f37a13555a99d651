//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Every error response has the same JSON shape:
//!
//! ```json
//! {"successFlag": false, "kind": "not_found", "message": "Product not found"}
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, TokenError};
use crate::services::cart::{CartError, MAX_QUANTITY};
use crate::services::catalog::CatalogError;
use crate::services::recommendation::RecommendationError;

/// Stable, machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Conflict,
    InvalidCredentials,
    NotFound,
    Forbidden,
    PasswordReused,
    InvalidOrExpiredToken,
    UpstreamUnavailable,
    ValidationError,
    Unauthorized,
    RateLimited,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::PasswordReused => "password_reused",
            Self::InvalidOrExpiredToken => "invalid_or_expired_token",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::ValidationError => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::Internal => "internal",
        }
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Conflict => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PasswordReused | Self::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success_flag: bool,
    pub kind: ErrorKind,
    pub message: String,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Recommendation lookup failed.
    #[error("Recommendation error: {0}")]
    Recommendation(#[from] RecommendationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed or invalid request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The category this error is reported as.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => ErrorKind::NotFound,
            Self::Database(RepositoryError::Conflict(_)) => ErrorKind::Conflict,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
                AuthError::UserNotFound => ErrorKind::NotFound,
                AuthError::UserAlreadyExists => ErrorKind::Conflict,
                AuthError::InvalidName(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidProfile(_) => ErrorKind::ValidationError,
                AuthError::PasswordReused => ErrorKind::PasswordReused,
                AuthError::InvalidOrExpiredToken => ErrorKind::InvalidOrExpiredToken,
                AuthError::Token(TokenError::Encode(_))
                | AuthError::Repository(_)
                | AuthError::PasswordHash => ErrorKind::Internal,
                AuthError::Token(_) => ErrorKind::Unauthorized,
            },
            Self::Cart(err) => match err {
                CartError::CartNotFound | CartError::ProductNotFound | CartError::ItemNotFound => {
                    ErrorKind::NotFound
                }
                CartError::Forbidden => ErrorKind::Forbidden,
                CartError::InvalidQuantity => ErrorKind::ValidationError,
                CartError::Repository(_) => ErrorKind::Internal,
            },
            Self::Catalog(err) => match err {
                CatalogError::ProductNotFound => ErrorKind::NotFound,
                CatalogError::InvalidQuery(_) => ErrorKind::ValidationError,
                CatalogError::Repository(_) => ErrorKind::Internal,
            },
            Self::Recommendation(err) => match err {
                RecommendationError::ProductNotFound => ErrorKind::NotFound,
                RecommendationError::Upstream(_) => ErrorKind::UpstreamUnavailable,
                RecommendationError::Repository(_) => ErrorKind::Internal,
            },
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::RateLimited => ErrorKind::RateLimited,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self {
            Self::Auth(AuthError::InvalidName(e)) => e.to_string(),
            Self::Auth(AuthError::WeakPassword(msg) | AuthError::InvalidProfile(msg))
            | Self::Catalog(CatalogError::InvalidQuery(msg))
            | Self::Validation(msg) => msg.clone(),
            Self::Auth(AuthError::UserAlreadyExists) => {
                "An account with this name already exists".to_string()
            }
            Self::Database(RepositoryError::Conflict(_)) => "Resource already exists".to_string(),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AuthError::UserNotFound) => "User not found".to_string(),
            Self::Auth(AuthError::PasswordReused) => {
                "New password must differ from your recent passwords".to_string()
            }
            Self::Auth(AuthError::InvalidOrExpiredToken) => {
                "Reset token is invalid or has expired".to_string()
            }
            Self::Auth(AuthError::Token(TokenError::Expired | TokenError::Invalid(_))) => {
                "Invalid or expired credentials".to_string()
            }
            Self::Cart(CartError::CartNotFound) => "Cart not found".to_string(),
            Self::Cart(CartError::ProductNotFound)
            | Self::Catalog(CatalogError::ProductNotFound)
            | Self::Recommendation(RecommendationError::ProductNotFound) => {
                "Product not found".to_string()
            }
            Self::Cart(CartError::ItemNotFound) => "Cart item not found".to_string(),
            Self::Cart(CartError::Forbidden) => "Cart item belongs to another user".to_string(),
            Self::Cart(CartError::InvalidQuantity) => {
                format!("Quantity must be between 1 and {MAX_QUANTITY}")
            }
            Self::Recommendation(RecommendationError::Upstream(_)) => {
                "Recommendation service unavailable".to_string()
            }
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(msg) => msg.clone(),
            Self::RateLimited => "Too many requests, slow down".to_string(),
            // Don't expose internal error details to clients
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Capture server errors to Sentry
        if matches!(kind, ErrorKind::Internal | ErrorKind::UpstreamUnavailable) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success_flag: false,
            kind,
            message: self.public_message(),
        };

        (kind.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "15970")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
