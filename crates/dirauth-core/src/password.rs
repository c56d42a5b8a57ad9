//! Local password hashing.
//!
//! Adapters that delegate authentication elsewhere still hand the umbrella application a
//! locally storable hash when a user is provisioned, so the account keeps working if the
//! directory backend is switched off later. The hash is never used to authenticate against the
//! directory.

use crate::{Error, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};

/// One-way password hash producer.
pub trait CredentialHasher: Send + Sync {
    /// Hashes the password into a storable string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordHash`] if hashing fails.
    fn hash(&self, password: &SecretString) -> Result<String>;
}

/// Argon2id hasher producing PHC strings.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Creates a hasher with custom Argon2 parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordHash`] if the parameters are rejected by Argon2.
    pub fn with_params(memory_cost: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_cost, iterations, parallelism, None)
            .map_err(|err| Error::PasswordHash(err.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Verifies a password against a PHC string produced by [`CredentialHasher::hash`].
    #[must_use]
    pub fn verify(&self, password: &SecretString, phc_hash: &str) -> bool {
        PasswordHash::new(phc_hash)
            .and_then(|parsed| {
                self.argon2()
                    .verify_password(password.expose_secret().as_bytes(), &parsed)
            })
            .is_ok()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &SecretString) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|err| Error::PasswordHash(err.to_string()))?;
        Ok(hash.to_string())
    }
}
