//! Cart and line item types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use fitroom_core::{CartId, CartItemId, ProductId, UserId};

use super::product::Product;

/// A user's cart. Exactly one exists per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A `(cart, product)` line item with a captured price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    /// Always the owner of `cart_id`.
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub cart_id: CartId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}

/// A line item joined with its product for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Product,
}

/// A cart with its lines and derived totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub id: CartId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub cart_items: Vec<CartLine>,
    /// Sum of captured item prices (not multiplied by quantity).
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    /// Sum of item quantities.
    pub total_item: i64,
}

impl CartSummary {
    /// Assemble a summary, computing totals from the lines.
    #[must_use]
    pub fn new(cart: &Cart, cart_items: Vec<CartLine>) -> Self {
        let total_price = cart_items.iter().map(|line| line.item.price).sum();
        let total_item = cart_items
            .iter()
            .map(|line| i64::from(line.item.quantity))
            .sum();

        Self {
            id: cart.id,
            user_id: cart.user_id,
            cart_items,
            total_price,
            total_item,
        }
    }
}
