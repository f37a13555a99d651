//! Password reset token row.

use chrono::{DateTime, Utc};

use fitroom_core::{ResetTokenId, UserId};

/// A stored reset token. Only the SHA-256 of the secret is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub id: ResetTokenId,
    pub user_id: UserId,
    /// Hex-encoded SHA-256 of the raw secret.
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// A token is live while its expiry is strictly in the future.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
