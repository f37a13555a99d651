//! Catalog product types.
//!
//! The JSON shape matches the product dataset (`productID`, `ProductName`,
//! `ProductDescription`, `Ratings`, ...) so seed files and API responses
//! share one representation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fitroom_core::ProductId;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "productID")]
    pub id: ProductId,
    #[serde(rename = "ProductName")]
    pub name: String,
    #[serde(rename = "ProductDescription", default)]
    pub description: ProductDescription,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
    /// Current unit cost.
    #[serde(rename = "productCost", with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(rename = "Ratings", default)]
    pub ratings: Ratings,
    #[serde(default)]
    pub image: Option<String>,
}

/// Descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescription {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
}

/// Aggregate rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub total_ratings: i32,
}

/// Catalog search criteria.
///
/// Text filters are case-insensitive substring matches; `gender` is exact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl ProductFilter {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Rows to skip for the requested page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Whether `product` satisfies every criterion (pagination aside).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        fn contains(haystack: Option<&str>, needle: Option<&String>) -> bool {
            needle.is_none_or(|needle| {
                haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            })
        }

        contains(Some(&product.name), self.name.as_ref())
            && contains(product.description.brand.as_deref(), self.brand.as_ref())
            && contains(product.description.color.as_deref(), self.color.as_ref())
            && self
                .gender
                .as_ref()
                .is_none_or(|g| product.gender.as_ref() == Some(g))
            && self.min_price.is_none_or(|min| product.cost >= min)
            && self.max_price.is_none_or(|max| product.cost <= max)
            && self
                .min_rating
                .is_none_or(|min| product.ratings.avg_rating >= min)
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub total_results: i64,
    pub current_page: u32,
    pub total_pages: i64,
    pub products: Vec<Product>,
}

impl ProductPage {
    #[must_use]
    pub fn new(products: Vec<Product>, total_results: i64, filter: &ProductFilter) -> Self {
        let limit = i64::from(filter.limit.max(1));
        Self {
            total_results,
            current_page: filter.page,
            total_pages: (total_results + limit - 1) / limit,
            products,
        }
    }
}
