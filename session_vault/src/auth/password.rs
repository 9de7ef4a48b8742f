//! Password hashing and strength validation.

use super::errors::{AuthError, AuthResult};
use crate::config::HasherConfig;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Argon2id password hasher with a server-side pepper
#[derive(Clone)]
pub struct CredentialHasher {
    pepper: String,
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher from cost parameters
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - Parameters outside argon2's accepted range
    pub fn new(config: &HasherConfig) -> AuthResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|_| AuthError::HashingFailed)?;

        Ok(Self {
            pepper: config.pepper.clone(),
            params,
        })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn peppered(&self, password: &str) -> String {
        format!("{}{}", password, self.pepper)
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2()
            .hash_password(self.peppered(password).as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify a password against a stored hash
    ///
    /// A malformed stored hash verifies as `false`.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2()
            .verify_password(self.peppered(password).as_bytes(), &parsed)
            .is_ok()
    }
}

/// Outcome of a password strength check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    pub valid: bool,
    /// Every violated rule, in rule order
    pub errors: Vec<String>,
}

/// Check a password against the strength rules
///
/// Rules: at least 8 characters, one uppercase letter, one lowercase letter
/// and one digit. All violations are reported.
pub fn validate_password_strength(password: &str) -> PasswordStrength {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }

    PasswordStrength {
        valid: errors.is_empty(),
        errors,
    }
}
