//! In-memory store implementing every store trait.
//!
//! Enforces the same uniqueness rules as the `PostgreSQL` schema. All tables
//! live behind one lock, so each trait call is atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use fitroom_core::{CartId, CartItemId, ProductId, ResetTokenId, Role, UserId, UserName};

use super::{CartStore, ProductStore, RepositoryError, ResetTokenStore, UserStore};
use crate::models::{
    Cart, CartItem, CartLine, Credentials, NewCartItem, NewUser, Preference, Product,
    ProductFilter, ResetToken, User,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<UserId, (User, Credentials)>,
    carts: BTreeMap<CartId, Cart>,
    items: BTreeMap<CartItemId, CartItem>,
    products: BTreeMap<ProductId, Product>,
    reset_tokens: BTreeMap<ResetTokenId, ResetToken>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared in-memory backing for [`super::Stores::in_memory`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_with_cart(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|(u, _)| u.name == new_user.name) {
            return Err(RepositoryError::Conflict("user name already exists".to_owned()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(tables.next_id()),
            name: new_user.name,
            age: new_user.age,
            gender: new_user.gender,
            country: new_user.country,
            preference: new_user.preference,
            role: Role::default(),
            created_at: now,
            updated_at: now,
        };
        let cart = Cart {
            id: CartId::new(tables.next_id()),
            user_id: user.id,
            created_at: now,
        };

        tables.carts.insert(cart.id, cart);
        tables.users.insert(
            user.id,
            (user.clone(), Credentials::initial(new_user.password_hash)),
        );
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn get_by_name(&self, name: &UserName) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| &u.name == name)
            .map(|(u, _)| u.clone()))
    }

    async fn find_credentials_by_name(
        &self,
        name: &UserName,
    ) -> Result<Option<(User, Credentials)>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|(u, _)| &u.name == name).cloned())
    }

    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, Credentials)>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn update_credentials(
        &self,
        id: UserId,
        credentials: &Credentials,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        let (user, stored) = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        *stored = credentials.clone();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_preference(
        &self,
        id: UserId,
        preference: &Preference,
    ) -> Result<Preference, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let (user, _) = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.preference = preference.clone();
        user.updated_at = Utc::now();
        Ok(user.preference.clone())
    }
}

#[async_trait]
impl ResetTokenStore for MemoryStore {
    async fn replace_for_user(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables
            .reset_tokens
            .values()
            .any(|t| t.token_hash == token_hash && t.user_id != user_id)
        {
            return Err(RepositoryError::Conflict("token hash already exists".to_owned()));
        }

        // Replacing keeps the row id, as the upsert does.
        let existing = tables
            .reset_tokens
            .values()
            .find(|t| t.user_id == user_id)
            .map(|t| t.id);
        let id = match existing {
            Some(id) => id,
            None => ResetTokenId::new(tables.next_id()),
        };

        let token = ResetToken {
            id,
            user_id,
            token_hash: token_hash.to_owned(),
            expires_at,
        };
        tables.reset_tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_live(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.is_live_at(now))
            .cloned())
    }

    async fn consume(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let id = tables
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.is_live_at(now))
            .map(|t| t.id);
        Ok(id.and_then(|id| tables.reset_tokens.remove(&id)))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let before = tables.reset_tokens.len();
        tables.reset_tokens.retain(|_, t| t.is_live_at(now));
        Ok(u64::try_from(before - tables.reset_tokens.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .carts
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn list_lines(&self, cart: &Cart) -> Result<Vec<CartLine>, RepositoryError> {
        let tables = self.tables.lock().await;
        tables
            .items
            .values()
            .filter(|i| i.cart_id == cart.id && i.user_id == cart.user_id)
            .map(|item| {
                let product = tables.products.get(&item.product_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart item {} references missing product {}",
                        item.id, item.product_id
                    ))
                })?;
                Ok(CartLine {
                    item: item.clone(),
                    product,
                })
            })
            .collect()
    }

    async fn find_item(
        &self,
        cart: &Cart,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.cart_id == cart.id && i.product_id == product_id)
            .cloned())
    }

    async fn insert_item_if_absent(
        &self,
        item: NewCartItem,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let owner_matches = tables
            .carts
            .get(&item.cart_id)
            .is_some_and(|c| c.user_id == item.user_id);
        if !owner_matches {
            return Err(RepositoryError::Conflict(
                "cart item owner must own the cart".to_owned(),
            ));
        }
        if !tables.products.contains_key(&item.product_id) {
            return Err(RepositoryError::Conflict("unknown product".to_owned()));
        }
        if tables
            .items
            .values()
            .any(|i| i.cart_id == item.cart_id && i.product_id == item.product_id)
        {
            return Ok(None);
        }

        let now = Utc::now();
        let created = CartItem {
            id: CartItemId::new(tables.next_id()),
            cart_id: item.cart_id,
            user_id: item.user_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            created_at: now,
            updated_at: now,
        };
        tables.items.insert(created.id, created.clone());
        Ok(Some(created))
    }

    async fn get_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.items.get(&id).cloned())
    }

    async fn update_item(
        &self,
        id: CartItemId,
        quantity: i32,
        price: Decimal,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let item = tables.items.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        item.quantity = quantity;
        item.price = price;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_item(&self, id: CartItemId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.items.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    async fn search(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let tables = self.tables.lock().await;
        let matches: Vec<&Product> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .collect();

        let total = i64::try_from(matches.len()).unwrap_or(i64::MAX);
        let skip = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let page = matches
            .into_iter()
            .skip(skip)
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.products.insert(product.id, product.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::{ProductDescription, Ratings};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: UserName::parse(name).unwrap(),
            age: None,
            gender: None,
            country: None,
            preference: Preference::default(),
            password_hash: "hash".to_string(),
        }
    }

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product {id}"),
            description: ProductDescription::default(),
            gender: None,
            season: None,
            usage: None,
            cost: Decimal::new(1999, 2),
            ratings: Ratings::default(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_cart_rejects_duplicate_name() {
        let store = MemoryStore::default();
        let user = store.create_with_cart(new_user("alice")).await.unwrap();
        assert!(store.get_cart_for_user(user.id).await.unwrap().is_some());

        let err = store.create_with_cart(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_replace_for_user_keeps_one_token() {
        let store = MemoryStore::default();
        let user = store.create_with_cart(new_user("alice")).await.unwrap();
        let expires = Utc::now() + Duration::minutes(15);

        store.replace_for_user(user.id, "first", expires).await.unwrap();
        store.replace_for_user(user.id, "second", expires).await.unwrap();

        let now = Utc::now();
        assert!(store.find_live("first", now).await.unwrap().is_none());
        assert!(store.find_live("second", now).await.unwrap().is_some());
        assert!(store.consume("second", now).await.unwrap().is_some());
        assert!(store.consume("second", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_token_cannot_claim_replacement() {
        let store = MemoryStore::default();
        let user = store.create_with_cart(new_user("alice")).await.unwrap();
        let now = Utc::now();
        let expires = now + Duration::minutes(15);

        let first = store.replace_for_user(user.id, "first", expires).await.unwrap();
        assert!(store.find_live("first", now).await.unwrap().is_some());
        let second = store.replace_for_user(user.id, "second", expires).await.unwrap();
        assert_eq!(first.id, second.id);

        assert!(store.consume("first", now).await.unwrap().is_none());
        assert!(store.find_live("second", now).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_consume_skips_expired() {
        let store = MemoryStore::default();
        let user = store.create_with_cart(new_user("alice")).await.unwrap();
        let now = Utc::now();
        store.replace_for_user(user.id, "old", now).await.unwrap();

        assert!(store.consume("old", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::default();
        let alice = store.create_with_cart(new_user("alice")).await.unwrap();
        let bob = store.create_with_cart(new_user("bobby")).await.unwrap();
        let now = Utc::now();

        store
            .replace_for_user(alice.id, "old", now - Duration::minutes(1))
            .await
            .unwrap();
        store
            .replace_for_user(bob.id, "new", now + Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert!(store.find_live("new", now).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_item_if_absent_is_unique_per_product() {
        let store = MemoryStore::default();
        store.upsert(&product(1)).await.unwrap();
        let user = store.create_with_cart(new_user("alice")).await.unwrap();
        let cart = store.get_cart_for_user(user.id).await.unwrap().unwrap();

        let item = NewCartItem {
            cart_id: cart.id,
            user_id: user.id,
            product_id: ProductId::new(1),
            quantity: 1,
            price: Decimal::new(1999, 2),
        };
        assert!(store.insert_item_if_absent(item.clone()).await.unwrap().is_some());
        assert!(store.insert_item_if_absent(item).await.unwrap().is_none());
        assert_eq!(store.list_lines(&cart).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_pages_in_id_order() {
        let store = MemoryStore::default();
        for id in [3, 1, 2] {
            store.upsert(&product(id)).await.unwrap();
        }
        let filter = ProductFilter {
            page: 2,
            limit: 2,
            ..ProductFilter::default()
        };

        let (page, total) = store.search(&filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, ProductId::new(3));
    }
}
