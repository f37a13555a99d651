//! Fitroom storefront library.
//!
//! The JSON API behind the Fitroom shop: accounts with password history and
//! reset tokens, one cart per user, a searchable product catalog and related
//! products from an external recommendation service. Exposed as a library so
//! the router can be driven from tests and the CLI can reuse the stores.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
