use std::sync::LazyLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use tracing::{error, warn};

/// Shortest password accepted at registration, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash checked when a login names no account, so that path costs a full
/// Argon2 verification like a wrong password does.
static DECOY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    register_credential("wicket-decoy-credential")
        .map_err(|e| error!("Could not build decoy password hash: {}", e))
        .ok()
});

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a password with Argon2id and a fresh random salt.
/// Returns the PHC string, which embeds the salt and parameters.
pub fn register_credential(password: &str) -> Result<String, PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LEN,
        });
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();

    Ok(hash)
}

/// Check a password against a stored PHC hash. The digest comparison inside
/// argon2 is constant time. An unparseable hash never verifies.
pub fn verify_credential(password: &str, password_hash: &str) -> bool {
    let parsed = match PasswordHash::new(password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Spend one verification against the decoy hash. Always `false`.
pub fn verify_decoy(password: &str) -> bool {
    if let Some(hash) = DECOY_HASH.as_deref() {
        let _ = verify_credential(password, hash);
    }
    false
}
