//! Storage for the storefront.
//!
//! # Database: `fitroom`, schema `storefront`
//!
//! ## Tables
//!
//! - `users` - Accounts, current password hash and bounded password history
//! - `products` - Catalog, keyed by the numeric catalog id
//! - `carts` - One per user
//! - `cart_items` - Unique per `(cart_id, product_id)`
//! - `password_reset_tokens` - At most one per user, hashed secret only
//!
//! Services never talk to `sqlx` directly; they go through the store traits
//! below. [`Stores::postgres`] wires the `PostgreSQL` implementations and
//! [`Stores::in_memory`] the [`memory::MemoryStore`] used by tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p fitroom-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod products;
pub mod reset_tokens;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use fitroom_core::{CartItemId, ProductId, UserId, UserName};

use crate::models::{
    Cart, CartItem, CartLine, Credentials, NewCartItem, NewUser, Preference, Product,
    ProductFilter, ResetToken, User,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate user name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Accounts and their credentials.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and its empty cart atomically.
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    async fn create_with_cart(&self, new_user: NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_by_name(&self, name: &UserName) -> Result<Option<User>, RepositoryError>;

    async fn find_credentials_by_name(
        &self,
        name: &UserName,
    ) -> Result<Option<(User, Credentials)>, RepositoryError>;

    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, Credentials)>, RepositoryError>;

    /// Persist the current hash and history.
    ///
    /// Returns `RepositoryError::NotFound` if the user is gone.
    async fn update_credentials(
        &self,
        id: UserId,
        credentials: &Credentials,
    ) -> Result<(), RepositoryError>;

    /// Replace the stored preference block.
    ///
    /// Returns `RepositoryError::NotFound` if the user is gone.
    async fn update_preference(
        &self,
        id: UserId,
        preference: &Preference,
    ) -> Result<Preference, RepositoryError>;
}

/// Password reset tokens.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Store a token for `user_id`, replacing any previous one.
    async fn replace_for_user(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, RepositoryError>;

    /// Find a token by hash whose expiry is after `now`.
    async fn find_live(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, RepositoryError>;

    /// Delete the live token with this hash and return it.
    ///
    /// Returns `None` if the token was consumed, replaced by a newer
    /// request, or expired at `now`.
    async fn consume(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, RepositoryError>;

    /// Delete every token that expired at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Carts and line items.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Lines of a cart with their products, in insertion order.
    async fn list_lines(&self, cart: &Cart) -> Result<Vec<CartLine>, RepositoryError>;

    async fn find_item(
        &self,
        cart: &Cart,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Insert a line item unless `(cart, product)` already has one.
    ///
    /// Returns `None` when a line item already existed.
    async fn insert_item_if_absent(
        &self,
        item: NewCartItem,
    ) -> Result<Option<CartItem>, RepositoryError>;

    async fn get_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError>;

    /// Returns `RepositoryError::NotFound` if the item is gone.
    async fn update_item(
        &self,
        id: CartItemId,
        quantity: i32,
        price: Decimal,
    ) -> Result<CartItem, RepositoryError>;

    /// Returns `false` if the item was already gone.
    async fn delete_item(&self, id: CartItemId) -> Result<bool, RepositoryError>;
}

/// The product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products for the given ids, in no particular order. Unknown ids are skipped.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// One page of matches ordered by catalog id, plus the total match count.
    async fn search(&self, filter: &ProductFilter)
    -> Result<(Vec<Product>, i64), RepositoryError>;

    /// Insert or replace a product by catalog id.
    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError>;
}

/// All stores used by the services, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub reset_tokens: Arc<dyn ResetTokenStore>,
    pub carts: Arc<dyn CartStore>,
    pub products: Arc<dyn ProductStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(users::PgUserStore::new(pool.clone())),
            reset_tokens: Arc::new(reset_tokens::PgResetTokenStore::new(pool.clone())),
            carts: Arc::new(carts::PgCartStore::new(pool.clone())),
            products: Arc::new(products::PgProductStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// In-memory stores sharing one [`memory::MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(&Arc::new(memory::MemoryStore::default()))
    }

    /// Wire every store to an existing [`memory::MemoryStore`].
    #[must_use]
    pub fn from_memory(store: &Arc<memory::MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            reset_tokens: store.clone(),
            carts: store.clone(),
            products: store.clone(),
            pool: None,
        }
    }

    /// The underlying pool, if backed by `PostgreSQL`.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Check the backing database is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
