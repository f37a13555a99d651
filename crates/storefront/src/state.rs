//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Stores;
use crate::services::auth::{AuthError, BearerTokens, PasswordHasher};
use crate::services::recommendation::{RecommendationGateway, Recommender};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything inside is built
/// once at startup and never mutated afterwards; the signing key in
/// particular is loaded from configuration and never regenerated.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    stores: Stores,
    hasher: PasswordHasher,
    tokens: BearerTokens,
    recommender: Recommender,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `stores` - Storage backends
    /// * `gateway` - Recommendation service client
    ///
    /// # Errors
    ///
    /// Returns an error if the password hashing parameters are invalid.
    pub fn new(
        config: StorefrontConfig,
        stores: Stores,
        gateway: Arc<dyn RecommendationGateway>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(config.password_hashing)?;
        let tokens = BearerTokens::new(&config.jwt_secret, config.token_ttl);
        let recommender = Recommender::new(gateway);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                hasher,
                tokens,
                recommender,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backends.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    #[must_use]
    pub fn hasher(&self) -> &PasswordHasher {
        &self.inner.hasher
    }

    /// Get a reference to the bearer credential signer.
    #[must_use]
    pub fn tokens(&self) -> &BearerTokens {
        &self.inner.tokens
    }

    #[must_use]
    pub fn recommender(&self) -> &Recommender {
        &self.inner.recommender
    }
}
