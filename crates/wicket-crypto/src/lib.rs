/// Wicket Crypto Library
///
/// Credential hashing (Argon2id) and stateless session tokens (HS256 JWT).
/// Nothing in here touches the network or the database.

pub mod password;
pub mod token;

pub use password::{
    MIN_PASSWORD_LEN, PasswordError, register_credential, verify_credential, verify_decoy,
};
pub use token::{SESSION_TTL, TokenError, issue_token, issue_token_at, verify_token, verify_token_at};
