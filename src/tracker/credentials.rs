//! Argon2id password hashing for stored accounts.

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::tracker::errors::TrackerError;

pub struct Credentials {
    argon2: Argon2<'static>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl Credentials {
    /// Argon2id with explicit params, or the library defaults when `None`.
    pub fn new(params: Option<Params>) -> Self {
        let argon2 = if let Some(p) = params {
            Argon2::new(Algorithm::Argon2id, Version::V0x13, p)
        } else {
            Argon2::default()
        };
        Self { argon2 }
    }

    /// Minimum-cost parameters for tests and throwaway stores.
    pub fn low_cost() -> Self {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .unwrap_or_default();
        Self::new(Some(params))
    }

    pub fn hash(&self, password: &str) -> Result<String, TrackerError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| TrackerError::PasswordHash(format!("hash failure: {e}")))?;
        Ok(hash.to_string())
    }

    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, TrackerError> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| TrackerError::PasswordHash(format!("corrupt password hash: {e}")))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
