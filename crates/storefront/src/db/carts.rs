//! Cart repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use fitroom_core::{CartId, CartItemId, ProductId, UserId};

use super::products::ProductRow;
use super::{CartStore, RepositoryError};
use crate::models::{Cart, CartItem, CartLine, NewCartItem};

const ITEM_COLUMNS: &str = "id, cart_id, user_id, product_id, quantity, price, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    user_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
        }
    }
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` cart store.
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get_cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM storefront.carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_lines(&self, cart: &Cart) -> Result<Vec<CartLine>, RepositoryError> {
        // Product columns are aliased so they don't collide with the item's.
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT i.id, i.cart_id, i.user_id, i.product_id, i.quantity, i.price,
                   i.created_at, i.updated_at,
                   p.product_id AS catalog_id, p.name, p.brand, p.size, p.color,
                   p.short_description, p.gender, p.season, p.usage, p.cost,
                   p.avg_rating, p.total_ratings, p.image
            FROM storefront.cart_items i
            JOIN storefront.products p ON p.product_id = i.product_id
            WHERE i.cart_id = $1 AND i.user_id = $2
            ORDER BY i.id
            ",
        )
        .bind(cart.id)
        .bind(cart.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CartLine {
                item: row.item.into(),
                product: row.product.into(),
            })
            .collect())
    }

    async fn find_item(
        &self,
        cart: &Cart,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM storefront.cart_items \
             WHERE cart_id = $1 AND product_id = $2"
        );
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(cart.id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_item_if_absent(
        &self,
        item: NewCartItem,
    ) -> Result<Option<CartItem>, RepositoryError> {
        // UNIQUE(cart_id, product_id) turns a concurrent duplicate add into a no-op.
        let sql = format!(
            r"
            INSERT INTO storefront.cart_items (cart_id, user_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (cart_id, product_id) DO NOTHING
            RETURNING {ITEM_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(item.cart_id)
            .bind(item.user_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn get_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM storefront.cart_items WHERE id = $1");
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn update_item(
        &self,
        id: CartItemId,
        quantity: i32,
        price: Decimal,
    ) -> Result<CartItem, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefront.cart_items
            SET quantity = $2, price = $3, updated_at = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(id)
            .bind(quantity)
            .bind(price)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_item(&self, id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
