//! SQLite-backed settings store.
//!
//! Values live in a single key-value table as JSON text:
//! - `focustimer.durations`: per-phase seconds
//! - `focustimer.current_task`: the task label
//! - `focustimer.session`: session number, phase and save time
//! - `focustimer.last_save`: epoch ms of the most recent write

use std::path::Path;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::{data_dir, KeyUsage, PersistenceStore, SessionSnapshot, StorageInfo};
use crate::error::{Result, StoreError};
use crate::timer::{now_ms, Durations};

const KEY_DURATIONS: &str = "focustimer.durations";
const KEY_CURRENT_TASK: &str = "focustimer.current_task";
const KEY_SESSION: &str = "focustimer.session";
const KEY_LAST_SAVE: &str = "focustimer.last_save";

const APP_KEYS: [&str; 4] = [KEY_DURATIONS, KEY_CURRENT_TASK, KEY_SESSION, KEY_LAST_SAVE];

/// SQLite database for timer settings.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/focustimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focustimer.db");
        Ok(Self::open_at(path)?)
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Epoch ms of the last successful write, if any.
    pub fn last_save_ms(&self) -> Result<Option<u64>, StoreError> {
        self.get_json(KEY_LAST_SAVE)
    }

    /// Which application keys hold data, their sizes, and the last save.
    ///
    /// # Errors
    /// Returns an error if the table cannot be read.
    pub fn storage_info(&self) -> Result<StorageInfo, StoreError> {
        let mut usage = Vec::with_capacity(APP_KEYS.len());
        for key in APP_KEYS {
            let size = self.kv_get(key)?.map_or(0, |v| v.len());
            usage.push(KeyUsage {
                name: key.to_string(),
                size,
                has_data: size > 0,
            });
        }
        Ok(StorageInfo {
            available: true,
            total_size: usage.iter().map(|u| u.size).sum(),
            usage,
            last_save_ms: self.last_save_ms()?,
        })
    }

    /// Decode a JSON value; corrupt entries are dropped and read as absent.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.kv_get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable stored value");
                self.kv_remove(key)?;
                Ok(None)
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, json],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![KEY_LAST_SAVE, now_ms().to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl PersistenceStore for Database {
    fn load_durations(&mut self) -> Result<Option<Durations>, StoreError> {
        self.get_json(KEY_DURATIONS)
    }

    fn save_durations(&mut self, durations: &Durations) -> Result<(), StoreError> {
        self.set_json(KEY_DURATIONS, durations)
    }

    fn load_current_task(&mut self) -> Result<Option<String>, StoreError> {
        self.get_json(KEY_CURRENT_TASK)
    }

    fn save_current_task(&mut self, text: &str) -> Result<(), StoreError> {
        self.set_json(KEY_CURRENT_TASK, &text)
    }

    fn clear_current_task(&mut self) -> Result<(), StoreError> {
        Ok(self.kv_remove(KEY_CURRENT_TASK)?)
    }

    fn load_session_snapshot(&mut self) -> Result<Option<SessionSnapshot>, StoreError> {
        self.get_json(KEY_SESSION)
    }

    fn save_session_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        self.set_json(KEY_SESSION, snapshot)
    }

    fn clear_session_snapshot(&mut self) -> Result<(), StoreError> {
        Ok(self.kv_remove(KEY_SESSION)?)
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for key in APP_KEYS {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_remove("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn durations_roundtrip_and_stamp_last_save() {
        let mut db = Database::open_memory().unwrap();
        assert!(db.load_durations().unwrap().is_none());
        assert!(db.last_save_ms().unwrap().is_none());

        let d = Durations::from_minutes(50, 10, 30);
        db.save_durations(&d).unwrap();
        assert_eq!(db.load_durations().unwrap(), Some(d));
        assert!(db.last_save_ms().unwrap().is_some());
    }

    #[test]
    fn storage_info_reports_sizes_and_last_save() {
        let mut db = Database::open_memory().unwrap();
        let empty = db.storage_info().unwrap();
        assert!(empty.available);
        assert_eq!(empty.total_size, 0);
        assert!(empty.usage.iter().all(|u| !u.has_data));
        assert!(empty.last_save_ms.is_none());

        db.kv_set("other.app", "not counted").unwrap();
        db.save_current_task("tidy desk").unwrap();
        let info = db.storage_info().unwrap();
        let task = info
            .usage
            .iter()
            .find(|u| u.name == KEY_CURRENT_TASK)
            .unwrap();
        // Stored as a JSON string, quotes included.
        assert_eq!(task.size, "\"tidy desk\"".len());
        assert!(task.has_data);
        assert!(!info.usage.iter().find(|u| u.name == KEY_DURATIONS).unwrap().has_data);
        assert_eq!(info.last_save_ms, db.last_save_ms().unwrap());
        assert!(info.last_save_ms.is_some());
        let stamp_len = info.last_save_ms.unwrap().to_string().len();
        assert_eq!(info.total_size, task.size + stamp_len);
    }

    #[test]
    fn corrupt_value_is_dropped() {
        let mut db = Database::open_memory().unwrap();
        db.kv_set(KEY_SESSION, "{not json").unwrap();
        assert!(db.load_session_snapshot().unwrap().is_none());
        assert!(db.kv_get(KEY_SESSION).unwrap().is_none());
    }

    #[test]
    fn clear_all_only_touches_app_keys() {
        let mut db = Database::open_memory().unwrap();
        db.kv_set("other.app", "keep").unwrap();
        db.save_current_task("read chapter 3").unwrap();
        db.save_session_snapshot(&SessionSnapshot {
            session_number: 2,
            phase: Phase::ShortBreak,
            saved_at_ms: now_ms(),
        })
        .unwrap();

        db.clear_all().unwrap();
        assert!(db.load_current_task().unwrap().is_none());
        assert!(db.load_session_snapshot().unwrap().is_none());
        assert_eq!(db.kv_get("other.app").unwrap().as_deref(), Some("keep"));
    }
}
