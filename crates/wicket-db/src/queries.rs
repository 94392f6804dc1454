use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode};
use uuid::Uuid;

use crate::models::{NewUser, UserRow};
use crate::{Database, Result, StoreError};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

impl Database {
    // -- Users --

    /// Insert a new user. Uniqueness of username and email is enforced by the
    /// table's unique indexes, so two racing signups cannot both succeed.
    pub fn create_user(&self, new: &NewUser) -> Result<UserRow> {
        let row = UserRow {
            id: Uuid::new_v4().to_string(),
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (&row.id, &row.username, &row.email, &row.password_hash, &row.created_at),
            )
            .map_err(map_unique_violation)?;
            Ok(())
        })?;

        Ok(row)
    }

    pub fn get_user_by_id(&self, id: &Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }
}

// `column` is always one of the literals above, never caller input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn map_unique_violation(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
        if code.code == ErrorCode::ConstraintViolation {
            if msg.contains("users.email") {
                return StoreError::Duplicate { field: "email" };
            }
            if msg.contains("users.username") {
                return StoreError::Duplicate { field: "username" };
            }
        }
    }
    err.into()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
