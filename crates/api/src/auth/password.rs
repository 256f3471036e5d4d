//! Passcode hashing and verification.
//!
//! Stored passcodes are Argon2id PHC strings. Records created before hashing
//! was introduced still hold the plaintext passcode; those are compared
//! directly until they are re-hashed.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a plaintext passcode using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext passcode against a stored PHC-formatted Argon2 hash.
///
/// Returns `Ok(true)` if the passcode matches, `Ok(false)` if it does not.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check a login attempt against a stored passcode of either form.
pub fn verify_passcode(password: &str, stored: &str) -> Result<bool, argon2::password_hash::Error> {
    if is_argon2_hash(stored) {
        verify_password(password, stored)
    } else {
        Ok(constant_time_eq(password.as_bytes(), stored.as_bytes()))
    }
}

fn is_argon2_hash(stored: &str) -> bool {
    stored.starts_with("$argon2")
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
