//! Cart aggregation.
//!
//! Every user owns exactly one cart, created at registration. Line items are
//! unique per product and carry the price captured when they were added.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use fitroom_core::{CartItemId, ProductId, UserId};

use crate::db::{CartStore, ProductStore, RepositoryError, Stores};
use crate::models::{Cart, CartItem, CartSummary, NewCartItem};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart not found")]
    CartNotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("cart item not found")]
    ItemNotFound,

    /// The item belongs to another user.
    #[error("cart item belongs to another user")]
    Forbidden,

    /// Quantity outside `1..=MAX_QUANTITY`, or a line price too large to store.
    #[error("quantity out of range")]
    InvalidQuantity,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Largest quantity a single line may hold.
pub const MAX_QUANTITY: i32 = 9_999;

/// Largest line price the `NUMERIC(12, 2)` price column can store.
const MAX_LINE_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Result of [`CartService::add_item`].
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// `false` when the product was already in the cart.
    pub added: bool,
    pub item: CartItem,
}

/// Cart service.
pub struct CartService<'a> {
    carts: &'a dyn CartStore,
    products: &'a dyn ProductStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub fn new(stores: &'a Stores) -> Self {
        Self {
            carts: stores.carts.as_ref(),
            products: stores.products.as_ref(),
        }
    }

    async fn cart_for(&self, user_id: UserId) -> Result<Cart, CartError> {
        self.carts
            .get_cart_for_user(user_id)
            .await?
            .ok_or(CartError::CartNotFound)
    }

    /// The user's cart with lines and derived totals.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the user has no cart.
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartSummary, CartError> {
        let cart = self.cart_for(user_id).await?;
        let lines = self.carts.list_lines(&cart).await?;
        Ok(CartSummary::new(&cart, lines))
    }

    /// Add one unit of a product, capturing its current cost.
    ///
    /// Adding a product that is already in the cart changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` or `CartError::ProductNotFound`.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<AddOutcome, CartError> {
        let cart = self.cart_for(user_id).await?;
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        if let Some(item) = self.carts.find_item(&cart, product_id).await? {
            return Ok(AddOutcome { added: false, item });
        }

        let inserted = self
            .carts
            .insert_item_if_absent(NewCartItem {
                cart_id: cart.id,
                user_id,
                product_id,
                quantity: 1,
                price: product.cost,
            })
            .await?;

        match inserted {
            Some(item) => {
                tracing::info!(item.id = %item.id, "cart item added");
                Ok(AddOutcome { added: true, item })
            }
            // Lost a race with a concurrent add of the same product.
            None => {
                let item = self
                    .carts
                    .find_item(&cart, product_id)
                    .await?
                    .ok_or(CartError::ItemNotFound)?;
                Ok(AddOutcome { added: false, item })
            }
        }
    }

    async fn owned_item(&self, user_id: UserId, item_id: CartItemId) -> Result<CartItem, CartError> {
        let item = self
            .carts
            .get_item(item_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;
        if item.user_id != user_id {
            tracing::warn!(item.id = %item_id, "cart item access by non-owner");
            return Err(CartError::Forbidden);
        }
        Ok(item)
    }

    /// Set an item's quantity and reprice it at `quantity × current cost`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a quantity outside
    /// `1..=MAX_QUANTITY` or a line price the store cannot hold,
    /// `CartError::ItemNotFound` or `CartError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, CartError> {
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }
        let item = self.owned_item(user_id, item_id).await?;
        let product = self
            .products
            .get(item.product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        let price = Decimal::from(quantity)
            .checked_mul(product.cost)
            .filter(|price| *price <= MAX_LINE_PRICE)
            .ok_or(CartError::InvalidQuantity)?;
        self.carts
            .update_item(item_id, quantity, price)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ItemNotFound,
                other => CartError::Repository(other),
            })
    }

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` or `CartError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<(), CartError> {
        self.owned_item(user_id, item_id).await?;
        if !self.carts.delete_item(item_id).await? {
            return Err(CartError::ItemNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitroom_core::UserName;

    use super::*;
    use crate::models::{NewUser, Preference, Product, ProductDescription, Ratings, User};

    async fn user(stores: &Stores, name: &str) -> User {
        stores
            .users
            .create_with_cart(NewUser {
                name: UserName::parse(name).unwrap(),
                age: None,
                gender: None,
                country: None,
                preference: Preference::default(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn product(stores: &Stores, id: i32, cents: i64) {
        stores
            .products
            .upsert(&Product {
                id: ProductId::new(id),
                name: format!("product {id}"),
                description: ProductDescription::default(),
                gender: None,
                season: None,
                usage: None,
                cost: Decimal::new(cents, 2),
                ratings: Ratings::default(),
                image: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_twice_keeps_one_item() {
        let stores = Stores::in_memory();
        let alice = user(&stores, "alice").await;
        product(&stores, 1, 2500).await;
        let carts = CartService::new(&stores);

        let first = carts.add_item(alice.id, ProductId::new(1)).await.unwrap();
        let second = carts.add_item(alice.id, ProductId::new(1)).await.unwrap();
        assert!(first.added);
        assert!(!second.added);
        assert_eq!(first.item.id, second.item.id);

        let summary = carts.get_cart(alice.id).await.unwrap();
        assert_eq!(summary.cart_items.len(), 1);
        assert_eq!(summary.cart_items[0].item.quantity, 1);
        assert_eq!(summary.total_item, 1);
        assert_eq!(summary.total_price, Decimal::new(2500, 2));
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let stores = Stores::in_memory();
        let alice = user(&stores, "alice").await;
        let carts = CartService::new(&stores);

        assert!(matches!(
            carts.add_item(alice.id, ProductId::new(99)).await,
            Err(CartError::ProductNotFound)
        ));
    }

    #[tokio::test]
    async fn test_missing_cart() {
        let stores = Stores::in_memory();
        let carts = CartService::new(&stores);
        assert!(matches!(
            carts.get_cart(UserId::new(404)).await,
            Err(CartError::CartNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_reprices_and_totals_sum_prices() {
        let stores = Stores::in_memory();
        let alice = user(&stores, "alice").await;
        product(&stores, 1, 1000).await;
        product(&stores, 2, 300).await;
        let carts = CartService::new(&stores);

        let a = carts.add_item(alice.id, ProductId::new(1)).await.unwrap().item;
        carts.add_item(alice.id, ProductId::new(2)).await.unwrap();

        let updated = carts.update_item(alice.id, a.id, 3).await.unwrap();
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.price, Decimal::new(3000, 2));

        let summary = carts.get_cart(alice.id).await.unwrap();
        assert_eq!(summary.total_item, 4);
        assert_eq!(summary.total_price, Decimal::new(3300, 2));
    }

    #[tokio::test]
    async fn test_update_rejects_zero_quantity() {
        let stores = Stores::in_memory();
        let alice = user(&stores, "alice").await;
        product(&stores, 1, 1000).await;
        let carts = CartService::new(&stores);
        let item = carts.add_item(alice.id, ProductId::new(1)).await.unwrap().item;

        assert!(matches!(
            carts.update_item(alice.id, item.id, 0).await,
            Err(CartError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_max_line_price_matches_column() {
        assert_eq!(MAX_LINE_PRICE, Decimal::new(999_999_999_999, 2));
    }

    #[tokio::test]
    async fn test_update_rejects_unstorable_quantity() {
        let stores = Stores::in_memory();
        let alice = user(&stores, "alice").await;
        product(&stores, 1, 19_999).await;
        product(&stores, 2, 500_000_000_000).await;
        let carts = CartService::new(&stores);
        let shirt = carts.add_item(alice.id, ProductId::new(1)).await.unwrap().item;
        let yacht = carts.add_item(alice.id, ProductId::new(2)).await.unwrap().item;

        assert!(matches!(
            carts.update_item(alice.id, shirt.id, 100_000_000).await,
            Err(CartError::InvalidQuantity)
        ));
        let max = carts.update_item(alice.id, shirt.id, MAX_QUANTITY).await.unwrap();
        assert_eq!(max.price, Decimal::new(199_970_001, 2));

        // 5e9 fits alone, 1e10 does not.
        assert!(matches!(
            carts.update_item(alice.id, yacht.id, 2).await,
            Err(CartError::InvalidQuantity)
        ));
        let unchanged = carts.get_cart(alice.id).await.unwrap();
        assert_eq!(unchanged.cart_items[1].item.quantity, 1);
    }

    #[tokio::test]
    async fn test_ownership_enforced() {
        let stores = Stores::in_memory();
        let alice = user(&stores, "alice").await;
        let mallory = user(&stores, "mallory").await;
        product(&stores, 1, 1000).await;
        let carts = CartService::new(&stores);
        let item = carts.add_item(alice.id, ProductId::new(1)).await.unwrap().item;

        assert!(matches!(
            carts.update_item(mallory.id, item.id, 2).await,
            Err(CartError::Forbidden)
        ));
        assert!(matches!(
            carts.remove_item(mallory.id, item.id).await,
            Err(CartError::Forbidden)
        ));

        carts.remove_item(alice.id, item.id).await.unwrap();
        assert!(matches!(
            carts.remove_item(alice.id, item.id).await,
            Err(CartError::ItemNotFound)
        ));
        assert!(carts.get_cart(alice.id).await.unwrap().cart_items.is_empty());
    }
}
