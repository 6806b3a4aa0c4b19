//! Password hashing and account tokens.

use crate::error::AppError;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;
use rand::RngCore;

const MEMORY_COST_KIB: u32 = 768;
const ITERATIONS: u32 = 1;
const PARALLELISM: u32 = 1;
const TOKEN_BYTES: usize = 32;

/// Hashed password and fresh token for an account.
pub struct AccountEncryption {
    pub password: String,
    pub token: String,
}

impl AccountEncryption {
    pub fn new(clear_password: &str) -> Result<Self, AppError> {
        Ok(AccountEncryption {
            password: hash_password(clear_password)?,
            token: new_token(),
        })
    }
}

fn password_hasher() -> Result<Argon2<'static>, AppError> {
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .map_err(|e| AppError::Internal(format!("argon2 parameters: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Argon2id hash in PHC string format.
pub fn hash_password(clear_password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = password_hasher()?
        .hash_password(clear_password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// False for a wrong password or an unparsable stored hash.
pub fn verify_password(clear_password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        tracing::warn!("stored password is not a valid hash");
        return false;
    };
    match password_hasher() {
        Ok(hasher) => hasher.verify_password(clear_password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Byte comparison whose time does not depend on where the inputs differ.
pub fn tokens_match(expected: &str, supplied: &str) -> bool {
    let (a, b) = (expected.as_bytes(), supplied.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Random hex token, usable in URLs.
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
