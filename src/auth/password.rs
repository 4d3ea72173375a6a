use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AppError, AppResult};

pub fn hash_password(password: &str) -> AppResult<String> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hashed: &str) -> AppResult<bool> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)
        .map_err(|e| AppError::internal(format!("stored password hash is invalid: {e}")))?;

    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}
