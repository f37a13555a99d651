//! Product catalog repository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use fitroom_core::ProductId;

use super::{ProductStore, RepositoryError};
use crate::models::{Product, ProductDescription, ProductFilter, Ratings};

const PRODUCT_COLUMNS: &str = "product_id AS catalog_id, name, brand, size, color, \
     short_description, gender, season, usage, cost, avg_rating, total_ratings, image";

/// Catalog row. The id is selected as `catalog_id` so it can be flattened
/// next to cart item columns.
#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    catalog_id: i32,
    name: String,
    brand: Option<String>,
    size: Option<String>,
    color: Option<String>,
    short_description: Option<String>,
    gender: Option<String>,
    season: Option<String>,
    usage: Option<String>,
    cost: Decimal,
    avg_rating: f64,
    total_ratings: i32,
    image: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.catalog_id),
            name: row.name,
            description: ProductDescription {
                brand: row.brand,
                size: row.size,
                color: row.color,
                short_description: row.short_description,
            },
            gender: row.gender,
            season: row.season,
            usage: row.usage,
            cost: row.cost,
            ratings: Ratings {
                avg_rating: row.avg_rating,
                total_ratings: row.total_ratings,
            },
            image: row.image,
        }
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Append the `WHERE` clause for `filter`.
fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a ProductFilter) {
    builder.push(" WHERE TRUE");

    for (column, needle) in [
        ("name", &filter.name),
        ("brand", &filter.brand),
        ("color", &filter.color),
    ] {
        if let Some(needle) = needle {
            builder
                .push(format!(" AND {column} ILIKE "))
                .push_bind(like_pattern(needle));
        }
    }
    if let Some(gender) = &filter.gender {
        builder.push(" AND gender = ").push_bind(gender);
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND cost >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND cost <= ").push_bind(max);
    }
    if let Some(min) = filter.min_rating {
        builder.push(" AND avg_rating >= ").push_bind(min);
    }
}

/// `PostgreSQL` product store.
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.products WHERE product_id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products WHERE product_id = ANY($1)"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(raw)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM storefront.products");
        push_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products"
        ));
        push_filter(&mut page, filter);
        page.push(" ORDER BY product_id LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows: Vec<ProductRow> = page.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.products
                (product_id, name, brand, size, color, short_description, gender, season,
                 usage, cost, avg_rating, total_ratings, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (product_id) DO UPDATE
            SET name = EXCLUDED.name,
                brand = EXCLUDED.brand,
                size = EXCLUDED.size,
                color = EXCLUDED.color,
                short_description = EXCLUDED.short_description,
                gender = EXCLUDED.gender,
                season = EXCLUDED.season,
                usage = EXCLUDED.usage,
                cost = EXCLUDED.cost,
                avg_rating = EXCLUDED.avg_rating,
                total_ratings = EXCLUDED.total_ratings,
                image = EXCLUDED.image
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description.brand)
        .bind(&product.description.size)
        .bind(&product.description.color)
        .bind(&product.description.short_description)
        .bind(&product.gender)
        .bind(&product.season)
        .bind(&product.usage)
        .bind(product.cost)
        .bind(product.ratings.avg_rating)
        .bind(product.ratings.total_ratings)
        .bind(&product.image)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
