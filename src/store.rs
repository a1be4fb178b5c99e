//! SQLite-backed item store.
//!
//! A single connection guarded by a mutex. Every call runs on tokio's blocking
//! pool, so the request thread stays free to accept other connections while
//! SQLite touches the disk. Writes are applied immediately; there is no
//! caching layer in front of the database.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use serde::Serialize;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
";

/// A persisted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    /// SQLite `CURRENT_TIMESTAMP` text, UTC (`YYYY-MM-DD HH:MM:SS`)
    pub created_at: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create data directory '{}': {source}", path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Store connection lock poisoned")]
    Poisoned,
}

#[derive(Clone)]
pub struct ItemStore {
    conn: Arc<Mutex<Connection>>,
}

impl ItemStore {
    /// Open (or create) the database `file` inside `dir`.
    ///
    /// Creates `dir` and the schema if missing. Safe to call on every start.
    pub fn open(dir: impl AsRef<Path>, file: &str) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| StoreError::DataDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(file);
        let conn = Connection::open(&path)?;
        tracing::debug!(path = %path.display(), "Opened item database");
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// All items, newest (highest id) first.
    pub async fn list(&self) -> Result<Vec<Item>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, created_at FROM items ORDER BY id DESC")?;
            let rows = stmt.query_map([], |row| {
                Ok(Item {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?;
            let items = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
        .await
    }

    /// Insert an item and return its id. `name` is stored as given.
    pub async fn create(&self, name: String) -> Result<i64, StoreError> {
        self.with_conn(move |conn| {
            conn.execute("INSERT INTO items (name) VALUES (?1)", params![name])?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Remove the item with `id`. Missing ids are ignored.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
            tracing::debug!(id, removed, "Deleted item");
            Ok(())
        })
        .await
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&conn)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let store = ItemStore::open_in_memory().unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = ItemStore::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for name in ["alpha", "beta", "gamma", "delta"] {
            ids.push(store.create(name.to_string()).await.unwrap());
        }

        let items = store.list().await.unwrap();
        let listed: Vec<i64> = items.iter().map(|item| item.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
        assert!(listed.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(items[0].name, "delta");
        assert!(!items[0].created_at.is_empty());
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = ItemStore::open_in_memory().unwrap();
        let first = store.create("one".to_string()).await.unwrap();
        let second = store.create("two".to_string()).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = ItemStore::open_in_memory().unwrap();
        store.create("one".to_string()).await.unwrap();
        let last = store.create("two".to_string()).await.unwrap();
        store.delete(last).await.unwrap();

        let next = store.create("three".to_string()).await.unwrap();
        assert!(next > last);
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_item() {
        let store = ItemStore::open_in_memory().unwrap();
        let keep = store.create("keep".to_string()).await.unwrap();
        let gone = store.create("gone".to_string()).await.unwrap();

        store.delete(gone).await.unwrap();

        let items = store.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, keep);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_noop() {
        let store = ItemStore::open_in_memory().unwrap();
        store.create("only".to_string()).await.unwrap();
        let before = store.list().await.unwrap();

        store.delete(9999).await.unwrap();

        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_open_creates_nested_directory_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");

        let store = ItemStore::open(&dir, "app.db").unwrap();
        let id = store.create("durable".to_string()).await.unwrap();
        drop(store);

        assert!(dir.join("app.db").exists());

        // Reopening runs the schema bootstrap again and keeps existing rows
        let reopened = ItemStore::open(&dir, "app.db").unwrap();
        let items = reopened.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].name, "durable");
    }

    #[test]
    fn test_open_fails_when_directory_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = ItemStore::open(&blocker, "app.db").err().unwrap();
        assert!(matches!(err, StoreError::DataDir { .. }));
    }
}
