//! Signup, login and session resolution, independent of HTTP.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use wicket_crypto::{
    SESSION_TTL, issue_token, register_credential, verify_credential, verify_decoy, verify_token,
};
use wicket_db::{NewUser, Store};
use wicket_types::api::{Claims, LoginRequest, SignupRequest};
use wicket_types::models::User;

use crate::error::ApiError;
use crate::validation::{normalize_email, validate_signup};

/// Result of a successful login.
pub struct Session {
    pub user: User,
    pub token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Store,
    token_secret: Arc<str>,
}

impl AuthService {
    pub fn new(store: Store, token_secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            token_secret: token_secret.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create an account. No token is issued; the caller logs in afterwards.
    /// Uniqueness is decided by the store's unique indexes at insert time.
    pub async fn signup(&self, req: SignupRequest) -> Result<User, ApiError> {
        let input = validate_signup(req)?;

        let password = input.password;
        let password_hash =
            tokio::task::spawn_blocking(move || register_credential(&password)).await??;

        let new_user = NewUser {
            username: input.username,
            email: input.email,
            password_hash,
        };
        let row = self.store.run(move |db| db.create_user(&new_user)).await?;
        let user = row.to_user()?;

        info!(user_id = %user.id, username = %user.username, "User signed up");
        Ok(user)
    }

    /// Check credentials and issue a session token. An unknown email and a
    /// wrong password both yield `InvalidCredentials` after one Argon2
    /// verification each.
    pub async fn login(&self, req: LoginRequest) -> Result<Session, ApiError> {
        let email = normalize_email(&req.email);
        if email.is_empty() || req.password.is_empty() {
            return Err(ApiError::Validation("Email and password are required".into()));
        }

        let password = req.password;

        let Some(row) = self.store.run(move |db| db.get_user_by_email(&email)).await? else {
            // Unknown accounts pay for one Argon2 verification too.
            tokio::task::spawn_blocking(move || verify_decoy(&password)).await?;
            warn!("Login rejected");
            return Err(ApiError::InvalidCredentials);
        };

        let password_hash = row.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_credential(&password, &password_hash))
                .await?;
        if !matches {
            warn!("Login rejected");
            return Err(ApiError::InvalidCredentials);
        }

        let user = row.to_user()?;
        let token = issue_token(user.id, &self.token_secret, SESSION_TTL)?;

        info!(user_id = %user.id, "User logged in");
        Ok(Session { user, token })
    }

    /// Validate a presented session token without touching the store.
    pub fn verify_session(&self, token: Option<&str>) -> Result<Claims, ApiError> {
        Ok(verify_token(token, &self.token_secret)?)
    }

    /// Load the user a verified token points at. The account may have vanished
    /// since the token was issued.
    pub async fn find_user(&self, id: Uuid) -> Result<User, ApiError> {
        let row = self
            .store
            .run(move |db| db.get_user_by_id(&id))
            .await?
            .ok_or(ApiError::NotFound)?;

        Ok(row.to_user()?)
    }
}
