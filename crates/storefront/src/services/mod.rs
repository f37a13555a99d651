//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, password rotation and reset, profile
//! - `cart` - Cart aggregation with ownership checks
//! - `catalog` - Product search and lookup
//! - `recommendation` - Related products via the external recommendation service
//!
//! Services borrow their stores for the duration of a request and hold no
//! state of their own, except [`recommendation::Recommender`]'s cache.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod recommendation;
