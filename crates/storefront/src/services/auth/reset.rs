//! Password reset tokens.
//!
//! A reset request yields a 64-byte random secret, returned to the caller
//! once. Only its SHA-256 is stored. Tokens expire 15 minutes after issue,
//! a newer request replaces an older one, and a token is consumed by the
//! reset that uses it.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::instrument;

use fitroom_core::UserName;

use super::{AuthError, PasswordHasher, validate_password};
use crate::db::{ResetTokenStore, Stores, UserStore};

/// Raw secret size in bytes.
pub const SECRET_BYTES: usize = 64;

/// Lifetime of a reset token.
pub const TOKEN_TTL: Duration = Duration::minutes(15);

/// Generate a hex-encoded random secret.
#[must_use]
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hex-encoded SHA-256 of a raw secret, as stored.
#[must_use]
pub fn hash_secret(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Issues and consumes password reset tokens.
pub struct ResetTokenIssuer<'a> {
    users: &'a dyn UserStore,
    tokens: &'a dyn ResetTokenStore,
    hasher: &'a PasswordHasher,
}

impl<'a> ResetTokenIssuer<'a> {
    #[must_use]
    pub fn new(stores: &'a Stores, hasher: &'a PasswordHasher) -> Self {
        Self {
            users: stores.users.as_ref(),
            tokens: stores.reset_tokens.as_ref(),
            hasher,
        }
    }

    /// Issue a token for `name`, replacing any previous one.
    ///
    /// Returns the raw secret, or `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if storage fails.
    pub async fn request_reset(&self, name: &UserName) -> Result<Option<String>, AuthError> {
        self.request_reset_at(name, Utc::now()).await
    }

    /// [`Self::request_reset`] with an explicit issue time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if storage fails.
    #[instrument(skip(self, name), fields(user.name = %name))]
    pub async fn request_reset_at(
        &self,
        name: &UserName,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        let Some(user) = self.users.get_by_name(name).await? else {
            tracing::info!("password reset requested for unknown user");
            return Ok(None);
        };

        let secret = generate_secret();
        let token = self
            .tokens
            .replace_for_user(user.id, &hash_secret(&secret), now + TOKEN_TTL)
            .await?;

        tracing::info!(user.id = %user.id, expires_at = %token.expires_at, "password reset token issued");
        Ok(Some(secret))
    }

    /// Set a new password using a reset secret.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidOrExpiredToken` if no live token matches
    /// - `AuthError::UserNotFound` if the token's user is gone
    /// - `AuthError::PasswordReused` if the password was used recently; the
    ///   token stays valid so the user can retry
    /// - `AuthError::WeakPassword` if the password fails validation
    pub async fn consume_reset(&self, raw_secret: &str, new_password: &str) -> Result<(), AuthError> {
        self.consume_reset_at(raw_secret, new_password, Utc::now())
            .await
    }

    /// [`Self::consume_reset`] with an explicit current time.
    ///
    /// # Errors
    ///
    /// See [`Self::consume_reset`].
    #[instrument(skip_all)]
    pub async fn consume_reset_at(
        &self,
        raw_secret: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let token_hash = hash_secret(raw_secret);
        let token = self
            .tokens
            .find_live(&token_hash, now)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let (user, mut credentials) = self
            .users
            .find_credentials_by_id(token.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.hasher.rotate(&mut credentials, new_password)?;

        // Claim by hash before writing. A concurrent reset, or a newer
        // request that replaced this token, leaves nothing to claim.
        let claimed = self
            .tokens
            .consume(&token_hash, now)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;
        if claimed.user_id != user.id {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        self.users.update_credentials(user.id, &credentials).await?;

        tracing::info!(user.id = %user.id, "password reset completed");
        Ok(())
    }
}
