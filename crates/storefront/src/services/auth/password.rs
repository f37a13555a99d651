//! Password hashing and the reuse check.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::AuthError;
use crate::config::PasswordHashingConfig;
use crate::models::Credentials;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Argon2id hasher with configured cost parameters.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash of a discarded random secret, verified when no account matches.
    dummy_hash: String,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl PasswordHasher {
    /// Build a hasher from cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the parameters are out of range.
    pub fn new(config: PasswordHashingConfig) -> Result<Self, AuthError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|_| AuthError::PasswordHash)?;

        let mut hasher = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(&super::reset::generate_secret())?;
        Ok(hasher)
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    }

    /// Verify a password against a stored hash.
    ///
    /// Verification parameters come from the PHC string, so hashes made with
    /// other cost settings still verify.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on mismatch or an unparseable hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    /// Run one verification that always fails.
    ///
    /// Lookups for unknown accounts pay the same Argon2 cost as a wrong
    /// password.
    #[must_use]
    pub fn verify_absent(&self, password: &str) -> AuthError {
        let _ = self.verify(password, &self.dummy_hash);
        AuthError::InvalidCredentials
    }

    /// Whether `password` matches the current hash or any hash in history.
    ///
    /// Hashes are salted, so each one is checked by verifying the plaintext.
    #[must_use]
    pub fn was_used(&self, password: &str, credentials: &Credentials) -> bool {
        std::iter::once(credentials.password_hash.as_str())
            .chain(credentials.history.iter())
            .any(|hash| self.verify(password, hash).is_ok())
    }

    /// Rotate `credentials` to `new_password`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordReused` if the password is current or in
    /// history, leaving `credentials` untouched.
    pub fn rotate(&self, credentials: &mut Credentials, new_password: &str) -> Result<(), AuthError> {
        if self.was_used(new_password, credentials) {
            return Err(AuthError::PasswordReused);
        }
        let hash = self.hash(new_password)?;
        credentials.rotate(hash);
        Ok(())
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the length is out of range.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Minimal Argon2 cost so tests stay fast.
    pub(crate) const FAST: PasswordHashingConfig = PasswordHashingConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    };

    #[test]
    fn test_verify_absent_uses_configured_cost() {
        let hasher = PasswordHasher::new(FAST).unwrap();
        assert!(matches!(
            hasher.verify_absent("Secret1!"),
            AuthError::InvalidCredentials
        ));

        let dummy = PasswordHash::new(&hasher.dummy_hash).unwrap();
        assert_eq!(dummy.params.get_decimal("m"), Some(FAST.memory_kib));
        assert_eq!(dummy.params.get_decimal("t"), Some(FAST.iterations));
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(FAST).unwrap();
        let hash = hasher.hash("Secret1!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Secret1!", &hash).is_ok());
        assert!(matches!(
            hasher.verify("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(FAST).unwrap();
        assert_ne!(hasher.hash("Secret1!").unwrap(), hasher.hash("Secret1!").unwrap());
    }

    #[test]
    fn test_rotate_rejects_last_six_and_accepts_older() {
        let hasher = PasswordHasher::new(FAST).unwrap();
        let mut creds = Credentials::initial(hasher.hash("password-0").unwrap());
        for n in 1..=6 {
            hasher.rotate(&mut creds, &format!("password-{n}")).unwrap();
        }

        // password-0 has been evicted; 1..=6 are still in history.
        for n in 1..=6 {
            assert!(matches!(
                hasher.rotate(&mut creds, &format!("password-{n}")),
                Err(AuthError::PasswordReused)
            ));
        }
        assert_eq!(creds.history.len(), 6);
        hasher.rotate(&mut creds, "password-0").unwrap();
        assert!(hasher.verify("password-0", &creds.password_hash).is_ok());
    }

    #[test]
    fn test_verify_unparseable_hash() {
        let hasher = PasswordHasher::new(FAST).unwrap();
        assert!(matches!(
            hasher.verify("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("exactly8").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }
}
