//! Domain models for storefront.

pub mod cart;
pub mod product;
pub mod reset_token;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, CartSummary, NewCartItem};
pub use product::{Product, ProductDescription, ProductFilter, ProductPage, Ratings};
pub use reset_token::ResetToken;
pub use user::{Credentials, NewUser, PasswordHistory, Preference, Profile, User};
