//! Password hashing for stored accounts.

use thiserror::Error;

/// Work factor applied when none is configured.
pub const DEFAULT_COST: u32 = 10;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

/// Hashes and verifies account passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Check `password` against a value produced by `hash`. Malformed stored
    /// values never verify.
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Salted bcrypt in the modular crypt format (`$2b$<cost>$...`).
///
/// The cost is carried inside every stored hash, so hashes written under an
/// older cost keep verifying after it is raised.
#[derive(Debug, Copy, Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        bcrypt::verify(password, stored).unwrap_or(false)
    }
}
