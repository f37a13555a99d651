//! Product catalog queries.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use fitroom_core::ProductId;

use crate::db::{ProductStore, RepositoryError, Stores};
use crate::models::{Product, ProductFilter, ProductPage};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found")]
    ProductNotFound,

    #[error("invalid search: {0}")]
    InvalidQuery(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Search parameters as received on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn non_negative(field: &str, value: Option<f64>) -> Result<Option<f64>, CatalogError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(CatalogError::InvalidQuery(format!(
            "{field} must be a non-negative number"
        ))),
        other => Ok(other),
    }
}

fn price(field: &str, value: Option<f64>) -> Result<Option<Decimal>, CatalogError> {
    non_negative(field, value)?
        .map(|v| {
            Decimal::try_from(v)
                .map_err(|_| CatalogError::InvalidQuery(format!("{field} is out of range")))
        })
        .transpose()
}

impl SearchParams {
    /// Validate and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidQuery` for a zero page, a limit outside
    /// `1..=100` or a negative bound.
    pub fn into_filter(self) -> Result<ProductFilter, CatalogError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(CatalogError::InvalidQuery("page must be at least 1".to_owned()));
        }
        let limit = self.limit.unwrap_or(ProductFilter::DEFAULT_LIMIT);
        if !(1..=ProductFilter::MAX_LIMIT).contains(&limit) {
            return Err(CatalogError::InvalidQuery(format!(
                "limit must be between 1 and {}",
                ProductFilter::MAX_LIMIT
            )));
        }

        Ok(ProductFilter {
            name: non_blank(self.name),
            brand: non_blank(self.brand),
            color: non_blank(self.color),
            gender: non_blank(self.gender),
            min_price: price("minPrice", self.min_price)?,
            max_price: price("maxPrice", self.max_price)?,
            min_rating: non_negative("minRating", self.min_rating)?,
            page,
            limit,
        })
    }
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: &'a dyn ProductStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub fn new(stores: &'a Stores) -> Self {
        Self {
            products: stores.products.as_ref(),
        }
    }

    /// One page of products matching `params`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidQuery` for invalid parameters.
    pub async fn search(&self, params: SearchParams) -> Result<ProductPage, CatalogError> {
        let filter = params.into_filter()?;
        let (products, total) = self.products.search(&filter).await?;
        Ok(ProductPage::new(products, total, &filter))
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if absent.
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .get(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }
}
