//! Password hashing for the user system
//!
//! Argon2id with default parameters and a fresh random salt per hash. Hashes
//! are stored as PHC strings, which carry their own salt and parameters.

use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::errors::UserError;
use crate::Result;

/// Hash a password using Argon2id
///
/// # Returns
/// The PHC-format hash string
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| UserError::HashingFailed {
            reason: e.to_string(),
        })?;

    Ok(hash.to_string())
}

/// Verify a password against its hash
///
/// # Returns
/// `Ok(true)` on a match, `Ok(false)` on a mismatch. `Err` only if the stored
/// hash cannot be parsed or names an unsupported algorithm.
pub fn verify_password(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash.as_ref()).map_err(|e| UserError::MalformedHash {
        reason: e.to_string(),
    })?;

    match Argon2::default().verify_password(password.as_ref().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(UserError::MalformedHash {
            reason: e.to_string(),
        }
        .into()),
    }
}
