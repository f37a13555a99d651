//! Authentication service.
//!
//! Registration, login, password rotation, password reset and the account
//! owner's profile and preferences.

mod error;
pub mod password;
pub mod reset;
pub mod token;

pub use error::AuthError;
pub use password::{PasswordHasher, validate_password};
pub use reset::ResetTokenIssuer;
pub use token::{BearerTokens, Claims, IssuedToken, TokenError};

use tracing::instrument;

use fitroom_core::{UserId, UserName};

use crate::db::{RepositoryError, Stores, UserStore};
use crate::models::{NewUser, Preference, Profile, User};

/// Oldest accepted age.
const MAX_AGE: i32 = 150;

/// Registration input, before validation.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub password: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub preference: Preference,
}

/// Account service.
///
/// Handles registration, login and password changes.
pub struct AccountService<'a> {
    users: &'a dyn UserStore,
    hasher: &'a PasswordHasher,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub fn new(stores: &'a Stores, hasher: &'a PasswordHasher) -> Self {
        Self {
            users: stores.users.as_ref(),
            hasher,
        }
    }

    /// Register a new user and provision their empty cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName` if the name format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::InvalidProfile` if the age is out of range.
    /// Returns `AuthError::UserAlreadyExists` if the name is already registered.
    #[instrument(skip_all, fields(user.name = %registration.name.trim()))]
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let name = UserName::parse(&registration.name)?;
        validate_password(&registration.password)?;
        if let Some(age) = registration.age
            && !(0..=MAX_AGE).contains(&age)
        {
            return Err(AuthError::InvalidProfile(format!(
                "age must be between 0 and {MAX_AGE}"
            )));
        }

        let password_hash = self.hasher.hash(&registration.password)?;

        let user = self
            .users
            .create_with_cart(NewUser {
                name,
                age: registration.age,
                gender: registration.gender,
                country: registration.country,
                preference: registration.preference,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user.id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with name and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the name/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, name: &str, password: &str) -> Result<User, AuthError> {
        // A malformed name cannot belong to any account.
        let Ok(name) = UserName::parse(name) else {
            return Err(self.hasher.verify_absent(password));
        };

        let Some((user, credentials)) = self.users.find_credentials_by_name(&name).await? else {
            return Err(self.hasher.verify_absent(password));
        };

        self.hasher.verify(password, &credentials.password_hash)?;

        Ok(user)
    }

    /// Change a user's password, refusing any of the recent ones.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user is unknown.
    /// Returns `AuthError::PasswordReused` if the password was used recently.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    #[instrument(skip_all, fields(user.name = %name))]
    pub async fn change_password(
        &self,
        name: &UserName,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let (user, mut credentials) = self
            .users
            .find_credentials_by_name(name)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.hasher.rotate(&mut credentials, new_password)?;
        self.users
            .update_credentials(user.id, &credentials)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user.id = %user.id, "password changed");
        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// The account owner's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn profile(&self, user_id: UserId) -> Result<Profile, AuthError> {
        self.get_user(user_id).await.map(Profile::from)
    }

    /// The stored preference block.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn preferences(&self, user_id: UserId) -> Result<Preference, AuthError> {
        self.get_user(user_id).await.map(|user| user.preference)
    }

    /// Replace the stored preference block.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self, preference))]
    pub async fn update_preferences(
        &self,
        user_id: UserId,
        preference: Preference,
    ) -> Result<Preference, AuthError> {
        self.users
            .update_preference(user_id, &preference)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}
