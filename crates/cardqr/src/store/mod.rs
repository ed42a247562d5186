//! Persistence layer for cardqr.
//!
//! App state is a handful of JSON values under well-known keys. Everything
//! above this module depends only on the [`KeyValueStore`] contract; the
//! `SQLite` backed [`SqliteStore`] is what the CLI uses, and [`MemoryStore`]
//! backs tests and embedding.

mod memory;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use memory::MemoryStore;

/// Key holding the theme preference.
pub const THEME_KEY: &str = "theme";

/// Key holding the ordered profile list.
pub const PROFILES_KEY: &str = "profiles";

/// Key holding the active profile id (string or null).
pub const ACTIVE_PROFILE_KEY: &str = "activeProfileId";

/// A string-keyed store of JSON values that survives restarts.
pub trait KeyValueStore {
    /// Read the raw JSON text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store can't be read.
    fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Replace the raw JSON text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store can't be written.
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store can't be written.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Check whether `key` holds a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store can't be read.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get_raw(key)?.is_some())
    }

    /// Read and deserialize the value under `key`, or `default` when absent.
    ///
    /// A value that no longer deserializes is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store can't be read.
    fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T>
    where
        Self: Sized,
    {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(default);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Ignoring unreadable value for '{}': {}", key, e);
                Ok(default)
            }
        }
    }

    /// Serialize `value` and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}

/// `SQLite` backed key-value store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List stored keys in name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl KeyValueStore for SqliteStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            (key, value),
        )?;
        debug!("Stored '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[test]
    fn test_open_in_memory() {
        let store = create_test_store();
        assert_eq!(store.path(), Path::new(":memory:"));
    }

    #[test]
    fn test_get_missing_returns_default() {
        let store = create_test_store();
        let value: String = store.get(THEME_KEY, "light".to_string()).unwrap();
        assert_eq!(value, "light");
        assert!(!store.contains(THEME_KEY).unwrap());
    }

    #[test]
    fn test_set_and_get() {
        let store = create_test_store();
        store.set(THEME_KEY, "dark").unwrap();

        let value: String = store.get(THEME_KEY, "light".to_string()).unwrap();
        assert_eq!(value, "dark");
        assert_eq!(store.get_raw(THEME_KEY).unwrap().as_deref(), Some("\"dark\""));
    }

    #[test]
    fn test_set_overwrites() {
        let store = create_test_store();
        store.set(ACTIVE_PROFILE_KEY, &Some("a")).unwrap();
        store.set(ACTIVE_PROFILE_KEY, &None::<String>).unwrap();

        let value: Option<String> = store
            .get(ACTIVE_PROFILE_KEY, Some("fallback".to_string()))
            .unwrap();
        assert!(value.is_none());
        assert_eq!(store.keys().unwrap(), vec![ACTIVE_PROFILE_KEY.to_string()]);
    }

    #[test]
    fn test_unreadable_value_falls_back_to_default() {
        let store = create_test_store();
        store.set_raw(PROFILES_KEY, "{not json").unwrap();

        let value: Vec<String> = store.get(PROFILES_KEY, vec!["seed".to_string()]).unwrap();
        assert_eq!(value, vec!["seed".to_string()]);
    }

    #[test]
    fn test_remove() {
        let store = create_test_store();
        store.set(THEME_KEY, "dark").unwrap();

        assert!(store.remove(THEME_KEY).unwrap());
        assert!(!store.remove(THEME_KEY).unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cardqr.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set(THEME_KEY, "dark").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let value: String = store.get(THEME_KEY, "light".to_string()).unwrap();
        assert_eq!(value, "dark");
    }
}
