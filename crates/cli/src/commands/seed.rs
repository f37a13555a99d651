//! Seed the product catalog from a JSON file.
//!
//! The file holds a JSON array in the catalog dataset format:
//!
//! ```json
//! [{
//!   "productID": 15970,
//!   "ProductName": "Navy Blue Shirt",
//!   "ProductDescription": {"brand": "Turtle", "size": "M", "color": "Navy Blue", "shortDescription": "..."},
//!   "gender": "Men", "season": "Fall", "usage": "Casual",
//!   "productCost": 28.99,
//!   "Ratings": {"avgRating": 4.1, "totalRatings": 128},
//!   "image": "https://..."
//! }]
//! ```
//!
//! Products are upserted on `productID`, so re-running a seed updates the
//! catalog in place.

use std::collections::HashSet;
use std::path::Path;

use tracing::{error, info};

use fitroom_storefront::db::Stores;
use fitroom_storefront::models::Product;

use super::connect;

/// Problems that make a seed file unsafe to import.
#[must_use]
pub fn validate_products(products: &[Product]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for product in products {
        let id = product.id;
        if !seen.insert(id) {
            errors.push(format!("product {id}: duplicate productID"));
        }
        if product.name.trim().is_empty() {
            errors.push(format!("product {id}: ProductName is empty"));
        }
        if product.cost.is_sign_negative() {
            errors.push(format!("product {id}: productCost is negative"));
        }
        let rating = product.ratings.avg_rating;
        if !rating.is_finite() || rating < 0.0 {
            errors.push(format!("product {id}: avgRating must be non-negative"));
        }
    }

    errors
}

/// Seed products from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or database operations fail.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Parse and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let products: Vec<Product> = serde_json::from_str(&content)?;

    info!(products = products.len(), "Parsed catalog");

    let errors = validate_products(&products);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let stores = Stores::postgres(connect().await?);
    info!("Connected to database");

    for product in &products {
        stores.products.upsert(product).await?;
    }

    info!(upserted = products.len(), "Catalog seeding complete");
    Ok(())
}
