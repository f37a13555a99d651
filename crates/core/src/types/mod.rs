//! Core types for Fitroom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod name;
pub mod role;

pub use id::*;
pub use name::{UserName, UserNameError};
pub use role::{Role, RoleParseError};
