//! Product catalog route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use fitroom_core::ProductId;

use super::{Success, success};
use crate::error::Result;
use crate::extract::{ApiPath, ApiQuery};
use crate::models::{Product, ProductPage};
use crate::services::catalog::{CatalogService, SearchParams};
use crate::state::AppState;

/// Filtered, paginated product search.
///
/// GET /api/v1/products?name=&brand=&color=&gender=&minPrice=&maxPrice=&minRating=&page=&limit=
///
/// # Errors
///
/// `validation_error` for invalid pagination or negative bounds.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Success<ProductPage>>> {
    let page = CatalogService::new(state.stores()).search(params).await?;
    Ok(success(page))
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

/// A single product.
///
/// GET /api/v1/products/{id}
///
/// # Errors
///
/// `not_found` if the product does not exist.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Success<ProductResponse>>> {
    let product = CatalogService::new(state.stores()).get(id).await?;
    Ok(success(ProductResponse { product }))
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub products: Vec<Product>,
}

/// Products related to the given one, from the recommendation service.
///
/// GET /api/v1/products/recommendation/{id}
///
/// # Errors
///
/// `not_found` if the product does not exist, `upstream_unavailable` if the
/// recommendation service fails or times out.
#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Success<RecommendationResponse>>> {
    let products = state.recommender().recommend(state.stores(), id).await?;
    Ok(success(RecommendationResponse { products }))
}
