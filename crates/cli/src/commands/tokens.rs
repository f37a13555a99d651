//! Password reset token maintenance.

use chrono::Utc;

use fitroom_storefront::db::{RepositoryError, Stores};

use super::{CommandError, connect};

#[derive(Debug, thiserror::Error)]
pub enum TokenCommandError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Delete every reset token whose expiry has passed.
///
/// Expired tokens are already unusable; this only reclaims the rows.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the delete fails.
pub async fn purge() -> Result<(), TokenCommandError> {
    let stores = Stores::postgres(connect().await?);

    let removed = stores.reset_tokens.purge_expired(Utc::now()).await?;

    tracing::info!(removed, "Expired reset tokens purged");
    Ok(())
}
