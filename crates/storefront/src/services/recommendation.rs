//! Related-product lookup through the external recommendation service.
//!
//! The service maps a product name to related catalog ids:
//!
//! ```text
//! GET {base}/recommend/{product name}
//! {"results": [{"id": 15970}, {"id": 39386}]}
//! ```
//!
//! Ids are resolved against the local catalog in the order returned; ids the
//! catalog doesn't know are dropped. Id lists are cached for 5 minutes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use fitroom_core::ProductId;

use crate::config::RecommendationConfig;
use crate::db::{RepositoryError, Stores};
use crate::models::Product;

/// Errors talking to the recommendation service.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("base URL cannot carry a path: {0}")]
    InvalidBaseUrl(Url),
}

/// Errors from [`Recommender::recommend`].
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("product not found")]
    ProductNotFound,

    #[error("recommendation service unavailable: {0}")]
    Upstream(#[from] GatewayError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Source of related product ids.
#[async_trait]
pub trait RecommendationGateway: Send + Sync {
    /// Catalog ids related to the named product, most relevant first.
    async fn related(&self, product_name: &str) -> Result<Vec<ProductId>, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct RecommendResponse {
    #[serde(default)]
    results: Vec<RecommendedId>,
}

#[derive(Debug, Deserialize)]
struct RecommendedId {
    id: ProductId,
}

/// HTTP client for the recommendation service.
pub struct HttpRecommendationGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRecommendationGateway {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Request` if the HTTP client cannot be built.
    pub fn new(config: &RecommendationConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, product_name: &str) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("recommend")
            .push(product_name);
        Ok(url)
    }
}

#[async_trait]
impl RecommendationGateway for HttpRecommendationGateway {
    #[instrument(skip(self))]
    async fn related(&self, product_name: &str) -> Result<Vec<ProductId>, GatewayError> {
        let url = self.endpoint(product_name)?;

        let response: RecommendResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.results.into_iter().map(|r| r.id).collect())
    }
}

/// Resolves recommendations against the local catalog, with caching.
#[derive(Clone)]
pub struct Recommender {
    inner: Arc<RecommenderInner>,
}

struct RecommenderInner {
    gateway: Arc<dyn RecommendationGateway>,
    cache: Cache<ProductId, Arc<Vec<ProductId>>>,
}

impl Recommender {
    #[must_use]
    pub fn new(gateway: Arc<dyn RecommendationGateway>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(RecommenderInner { gateway, cache }),
        }
    }

    /// Products related to `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RecommendationError::ProductNotFound` if the product is
    /// unknown and `RecommendationError::Upstream` if the service fails.
    #[instrument(skip(self, stores))]
    pub async fn recommend(
        &self,
        stores: &Stores,
        product_id: ProductId,
    ) -> Result<Vec<Product>, RecommendationError> {
        let product = stores
            .products
            .get(product_id)
            .await?
            .ok_or(RecommendationError::ProductNotFound)?;

        let ids = if let Some(ids) = self.inner.cache.get(&product_id).await {
            debug!("Cache hit for recommendations");
            ids
        } else {
            let ids = Arc::new(self.inner.gateway.related(&product.name).await?);
            self.inner.cache.insert(product_id, ids.clone()).await;
            ids
        };

        let mut by_id: HashMap<ProductId, Product> = stores
            .products
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| by_id.remove(id))
            .collect())
    }
}
