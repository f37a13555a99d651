//! Cart route handlers.
//!
//! Every cart route requires a bearer credential; line items can only be
//! changed by the user who owns them.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fitroom_core::{CartItemId, ProductId};

use super::auth::Message;
use super::{Success, success};
use crate::error::{Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{CartItem, CartSummary};
use crate::services::cart::CartService;
use crate::state::AppState;

/// The caller's cart with derived totals.
///
/// GET /api/v1/cart
///
/// # Errors
///
/// `not_found` if the user has no cart.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Success<CartSummary>>> {
    let summary = CartService::new(state.stores()).get_cart(auth.id).await?;
    Ok(success(summary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    /// `false` when the product was already in the cart.
    pub added: bool,
    pub item: CartItem,
}

/// Add one unit of a product to the caller's cart.
///
/// PUT /api/v1/cart/add
///
/// Adding a product that is already in the cart is a no-op and answers
/// 200 with `added: false`; a new line answers 201.
///
/// # Errors
///
/// `not_found` if the product or cart does not exist.
#[instrument(skip_all, fields(product.id = %req.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(req): ApiJson<AddToCartRequest>,
) -> Result<(StatusCode, Json<Success<AddToCartResponse>>)> {
    let outcome = CartService::new(state.stores())
        .add_item(auth.id, req.product_id)
        .await?;

    let product_id = req.product_id.to_string();
    add_breadcrumb(
        "cart",
        "Added product",
        Some(&[("product_id", product_id.as_str())]),
    );

    let status = if outcome.added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        success(AddToCartResponse {
            added: outcome.added,
            item: outcome.item,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Set a line item's quantity.
///
/// PUT /api/v1/cart_items/{id}
///
/// # Errors
///
/// `validation_error` for a quantity below 1, `not_found` for an unknown
/// item and `forbidden` if the item belongs to someone else.
#[instrument(skip_all, fields(item.id = %id))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(req): ApiJson<UpdateItemRequest>,
) -> Result<Json<Success<CartItem>>> {
    let item = CartService::new(state.stores())
        .update_item(auth.id, id, req.quantity)
        .await?;
    Ok(success(item))
}

/// Remove a line item.
///
/// DELETE /api/v1/cart_items/{id}
///
/// # Errors
///
/// `not_found` for an unknown item and `forbidden` if the item belongs to
/// someone else.
#[instrument(skip_all, fields(item.id = %id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<Json<Success<Message>>> {
    CartService::new(state.stores())
        .remove_item(auth.id, id)
        .await?;
    Ok(success(Message {
        message: "Item removed",
    }))
}
