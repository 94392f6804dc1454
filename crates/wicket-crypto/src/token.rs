use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use wicket_types::api::Claims;

/// Lifetime of a session token issued at login.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("no session token presented")]
    Missing,
    #[error("session token is malformed or carries a bad signature")]
    Malformed,
    #[error("session token has expired")]
    Expired,
    #[error("failed to sign session token: {0}")]
    Signing(String),
}

pub fn issue_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    issue_token_at(user_id, secret, ttl, Utc::now())
}

/// Sign an HS256 token for `user_id`, valid from `now` for `ttl`.
pub fn issue_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let iat = now.timestamp();
    let claims = Claims {
        id: user_id,
        iat,
        exp: iat.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

pub fn verify_token(token: Option<&str>, secret: &str) -> Result<Claims, TokenError> {
    verify_token_at(token, secret, Utc::now())
}

/// Check the signature first, then expiry against `now`.
/// A token is live only while `now < exp`; there is no leeway.
pub fn verify_token_at(
    token: Option<&str>,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<Claims, TokenError> {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(TokenError::Missing),
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!("Rejected session token: {:?}", e.kind());
        TokenError::Malformed
    })?;

    if now.timestamp() >= data.claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeDelta;

    const SECRET: &str = "test-secret-0123456789";

    #[test]
    fn issue_then_verify_returns_id() {
        let id = Uuid::new_v4();
        let token = issue_token(id, SECRET, SESSION_TTL).unwrap();

        let claims = verify_token(Some(&token), SECRET).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn expires_once_clock_passes_exp() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let token = issue_token_at(id, SECRET, SESSION_TTL, now).unwrap();

        let just_before = now + TimeDelta::seconds(86_399);
        assert_eq!(verify_token_at(Some(&token), SECRET, just_before).unwrap().id, id);

        let at_exp = now + TimeDelta::seconds(86_400);
        assert_eq!(
            verify_token_at(Some(&token), SECRET, at_exp),
            Err(TokenError::Expired)
        );

        let later = now + TimeDelta::days(3);
        assert_eq!(
            verify_token_at(Some(&token), SECRET, later),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn huge_ttl_saturates_instead_of_wrapping() {
        let now = Utc::now();
        let token = issue_token_at(Uuid::new_v4(), SECRET, Duration::MAX, now).unwrap();

        let claims = verify_token_at(Some(&token), SECRET, now).unwrap();
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn token_issued_long_ago_is_expired_now() {
        let two_days_ago = Utc::now() - TimeDelta::days(2);
        let token = issue_token_at(Uuid::new_v4(), SECRET, SESSION_TTL, two_days_ago).unwrap();
        assert_eq!(verify_token(Some(&token), SECRET), Err(TokenError::Expired));
    }

    #[test]
    fn other_secret_is_malformed() {
        let token = issue_token(Uuid::new_v4(), SECRET, SESSION_TTL).unwrap();
        assert_eq!(
            verify_token(Some(&token), "some-other-secret-value"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        let two_days_ago = Utc::now() - TimeDelta::days(2);
        let token = issue_token_at(Uuid::new_v4(), SECRET, SESSION_TTL, two_days_ago).unwrap();
        assert_eq!(
            verify_token(Some(&token), "some-other-secret-value"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn tampered_payload_is_malformed() {
        let token = issue_token(Uuid::new_v4(), SECRET, SESSION_TTL).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let forged = serde_json::json!({
            "id": Uuid::new_v4(),
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 86_400,
        });
        let forged_payload = URL_SAFE_NO_PAD.encode(forged.to_string());
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(verify_token(Some(&tampered), SECRET), Err(TokenError::Malformed));
    }

    #[test]
    fn payload_without_id_is_malformed() {
        let claims = serde_json::json!({
            "sub": "someone",
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 3600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify_token(Some(&token), SECRET), Err(TokenError::Malformed));
    }

    #[test]
    fn absent_token_is_missing() {
        assert_eq!(verify_token(None, SECRET), Err(TokenError::Missing));
        assert_eq!(verify_token(Some(""), SECRET), Err(TokenError::Missing));
        assert_eq!(verify_token(Some("   "), SECRET), Err(TokenError::Missing));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            verify_token(Some("invalid.token.here"), SECRET),
            Err(TokenError::Malformed)
        );
        assert_eq!(verify_token(Some("abc"), SECRET), Err(TokenError::Malformed));
    }
}
