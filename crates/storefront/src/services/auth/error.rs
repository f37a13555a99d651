//! Authentication error types.

use thiserror::Error;

use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid user name format.
    #[error("invalid name: {0}")]
    InvalidName(#[from] fitroom_core::UserNameError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Profile field out of range.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// New password matches the current one or one in history.
    #[error("password was used recently")]
    PasswordReused,

    /// Reset token unknown, consumed, or expired.
    #[error("invalid or expired reset token")]
    InvalidOrExpiredToken,

    /// Bearer credential error.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
