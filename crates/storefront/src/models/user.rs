//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fitroom_core::{Role, UserId, UserName};

/// A storefront account (domain type).
///
/// Never carries password material; see [`Credentials`].
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login handle, unique across accounts.
    pub name: UserName,
    /// Age in years, if provided.
    pub age: Option<i32>,
    /// Self-described gender, if provided.
    pub gender: Option<String>,
    /// Country, if provided.
    pub country: Option<String>,
    /// Stated style preferences.
    pub preference: Preference,
    /// Role embedded in bearer credentials.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Stated style/color/size preference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub style: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Fields supplied at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: UserName,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub preference: Preference,
    /// PHC string of the initial password.
    pub password_hash: String,
}

/// Secret half of an account: the current hash plus the reuse history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// PHC string of the current password.
    pub password_hash: String,
    /// Recent password hashes, oldest first. Includes the current hash.
    pub history: PasswordHistory,
}

impl Credentials {
    /// Credentials for a freshly registered account: the first hash is both
    /// current and the sole history entry.
    #[must_use]
    pub fn initial(password_hash: String) -> Self {
        let mut history = PasswordHistory::default();
        history.push(password_hash.clone());
        Self {
            password_hash,
            history,
        }
    }

    /// Make `password_hash` current and record it in the history.
    pub fn rotate(&mut self, password_hash: String) {
        self.history.push(password_hash.clone());
        self.password_hash = password_hash;
    }
}

/// Insertion-ordered list of the most recent password hashes.
///
/// Holds at most [`PasswordHistory::CAPACITY`] entries; pushing onto a full
/// history evicts the oldest entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordHistory(Vec<String>);

impl PasswordHistory {
    /// Maximum number of hashes retained.
    pub const CAPACITY: usize = 6;

    /// Build a history from stored hashes (oldest first), keeping only the
    /// newest [`Self::CAPACITY`] entries.
    #[must_use]
    pub fn from_stored(mut hashes: Vec<String>) -> Self {
        if hashes.len() > Self::CAPACITY {
            hashes.drain(..hashes.len() - Self::CAPACITY);
        }
        Self(hashes)
    }

    /// Append a hash, evicting the oldest once over capacity.
    pub fn push(&mut self, hash: String) {
        self.0.push(hash);
        if self.0.len() > Self::CAPACITY {
            self.0.remove(0);
        }
    }

    /// Iterate hashes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Profile returned to the account owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub name: UserName,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub preference: Preference,
    pub role: Role,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            age: user.age,
            gender: user.gender,
            country: user.country,
            preference: user.preference,
            role: user.role,
        }
    }
}
