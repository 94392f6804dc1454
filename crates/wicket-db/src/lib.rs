pub mod migrations;
pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::info;

pub use models::{NewUser, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{field} is already taken")]
    Duplicate { field: &'static str },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt row for user {id}: {reason}")]
    Corrupt { id: String, reason: String },
    #[error("database lock poisoned")]
    Poisoned,
    #[error("database task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database named by a connection string. Accepts a bare path,
    /// `sqlite://path`, `sqlite:path` or `:memory:`.
    pub fn connect(url: &str) -> Result<Self> {
        let target = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if target == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(target))
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;

        info!("In-memory database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}

/// Process-wide handle to the user database.
///
/// The connection is opened on first use and shared afterwards; concurrent
/// first callers all wait on the same initialization. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    url: String,
    db: OnceCell<Arc<Database>>,
}

impl Store {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                url: url.into(),
                db: OnceCell::new(),
            }),
        }
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                url: String::new(),
                db: OnceCell::from(Arc::new(db)),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.db.initialized()
    }

    /// Return the shared database, opening it if this is the first call.
    pub async fn get(&self) -> Result<Arc<Database>> {
        self.inner
            .db
            .get_or_try_init(|| async {
                let url = self.inner.url.clone();
                let db = tokio::task::spawn_blocking(move || Database::connect(&url))
                    .await
                    .map_err(|e| StoreError::Join(e.to_string()))??;
                Ok::<_, StoreError>(Arc::new(db))
            })
            .await
            .cloned()
    }

    /// Run a blocking database operation off the async runtime.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.get().await?;
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_connects_lazily_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wicket.db");
        let store = Store::new(format!("sqlite://{}", path.display()));

        assert!(!store.is_connected());
        assert!(!path.exists());

        let (a, b) = tokio::join!(store.get(), store.get());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(store.is_connected());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn connect_failure_surfaces_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("missing").join("nested").join("wicket.db");
        let store = Store::new(bad.display().to_string());

        assert!(store.get().await.is_err());
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn memory_url_opens_in_memory() {
        let store = Store::new(":memory:");
        let count = store
            .run(|db| {
                db.with_conn(|conn| {
                    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get::<_, i64>(0))?)
                })
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
