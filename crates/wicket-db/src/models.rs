//! Database row types. These map directly to SQLite rows and are distinct
//! from the wicket-types models so the hash never leaves this layer by accident.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use uuid::Uuid;
use wicket_types::models::User;

use crate::StoreError;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

// Hand-written so the hash never ends up in a log line.
impl fmt::Debug for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl UserRow {
    pub fn to_user(&self) -> Result<User, StoreError> {
        let id = self.id.parse::<Uuid>().map_err(|e| StoreError::Corrupt {
            id: self.id.clone(),
            reason: format!("bad id: {}", e),
        })?;

        let created_at = self
            .created_at
            .parse::<DateTime<Utc>>()
            .or_else(|_| {
                NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| ndt.and_utc())
            })
            .map_err(|e| StoreError::Corrupt {
                id: self.id.clone(),
                reason: format!("bad created_at '{}': {}", self.created_at, e),
            })?;

        Ok(User {
            id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at,
        })
    }
}

/// Input to `Database::create_user`. The hash is produced by the caller.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(created_at: &str) -> UserRow {
        UserRow {
            id: "6f1c1a8e-8f0e-4d55-9a3c-3f0c1f2b7a10".into(),
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            created_at: created_at.into(),
        }
    }

    #[test]
    fn debug_redacts_hash() {
        let out = format!("{:?}", row("2024-01-01T00:00:00Z"));
        assert!(out.contains("<redacted>"));
        assert!(!out.contains("argon2id"));
    }

    #[test]
    fn parses_rfc3339_and_sqlite_timestamps() {
        assert!(row("2024-01-01T00:00:00+00:00").to_user().is_ok());
        assert!(row("2024-01-01 00:00:00").to_user().is_ok());
        assert!(matches!(
            row("yesterday").to_user(),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
