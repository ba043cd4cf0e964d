mod config;
pub mod database;
pub mod memory;

pub use config::{
    AnalyticsConfig, Config, DefaultsConfig, MicroSprintConfig, NotificationsConfig,
    ShortcutsConfig, StatusConfig,
};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, CoreError, StoreError};
use crate::timer::{Durations, Phase};

/// Saved session older than this is discarded on load.
pub const SESSION_MAX_AGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Longest task text that will be persisted (exclusive).
pub const MAX_TASK_LEN: usize = 500;

/// Returns the data directory, creating it if needed.
///
/// `FOCUSTIMER_DATA_DIR` overrides the location outright. Otherwise the
/// directory is `~/.config/focustimer[-dev]/`, with `FOCUSTIMER_ENV=dev`
/// selecting the development variant.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSTIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focustimer-dev")
            } else {
                base_dir.join("focustimer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(ConfigError::DataDir)?;
    Ok(dir)
}

/// Where the engine was when the session was last saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_number: u32,
    pub phase: Phase,
    pub saved_at_ms: u64,
}

impl SessionSnapshot {
    /// True when the snapshot is more than 24 hours away from `now_ms`,
    /// in either direction.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        now_ms.abs_diff(self.saved_at_ms) > SESSION_MAX_AGE_MS
    }
}

/// Key-value settings store the timer loads from and saves to.
///
/// Loads report `Ok(None)` for absent (or unreadable) data; callers treat
/// every error as "absent" for loads and as "save failed" for writes.
pub trait PersistenceStore: Send {
    fn load_durations(&mut self) -> Result<Option<Durations>, StoreError>;
    fn save_durations(&mut self, durations: &Durations) -> Result<(), StoreError>;

    fn load_current_task(&mut self) -> Result<Option<String>, StoreError>;
    fn save_current_task(&mut self, text: &str) -> Result<(), StoreError>;
    fn clear_current_task(&mut self) -> Result<(), StoreError>;

    fn load_session_snapshot(&mut self) -> Result<Option<SessionSnapshot>, StoreError>;
    fn save_session_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;
    fn clear_session_snapshot(&mut self) -> Result<(), StoreError>;

    /// Remove every value this application stored.
    fn clear_all(&mut self) -> Result<(), StoreError>;
}

/// Portable dump of the user's stored settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataExport {
    pub current_task: Option<String>,
    pub durations: Durations,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

impl UserDataExport {
    /// Read an export file written by [`UserDataExport::write_to`].
    ///
    /// Durations are clamped to their bounds as they are read.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not an export.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the export as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json + "\n")?;
        Ok(())
    }
}

/// Per-key usage of the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyUsage {
    pub name: String,
    /// Stored value length in bytes; zero when absent.
    pub size: usize,
    pub has_data: bool,
}

/// What the settings store holds and when it last changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    pub available: bool,
    pub total_size: usize,
    pub usage: Vec<KeyUsage>,
    pub last_save_ms: Option<u64>,
}

/// Collect everything the store holds for this user.
///
/// # Errors
/// Returns an error if the store cannot be read.
pub fn export(store: &mut dyn PersistenceStore) -> Result<UserDataExport, StoreError> {
    Ok(UserDataExport {
        current_task: store.load_current_task()?,
        durations: store.load_durations()?.unwrap_or_default(),
        exported_at: Utc::now(),
        version: "1.0".to_string(),
    })
}

/// Write an export back into the store. Returns whether anything was saved.
///
/// The task follows the same rules as [`normalize_task`]; an unusable task
/// is skipped while the durations still go in.
pub fn import(store: &mut dyn PersistenceStore, data: &UserDataExport) -> bool {
    let mut imported = 0;
    match store.save_durations(&data.durations) {
        Ok(()) => imported += 1,
        Err(e) => warn!(error = %e, "failed to import durations"),
    }
    match data.current_task.as_deref().map(normalize_task) {
        Some(Some(task)) => match store.save_current_task(task) {
            Ok(()) => imported += 1,
            Err(e) => warn!(error = %e, "failed to import current task"),
        },
        Some(None) => debug!("skipping unusable task in import"),
        None => {}
    }
    debug!(imported, version = %data.version, "import finished");
    imported > 0
}

/// Normalize task text for storage: trimmed, non-empty, under 500 chars.
pub fn normalize_task(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    // The length limit applies to the text as typed, surrounding spaces included.
    if trimmed.is_empty() || text.chars().count() >= MAX_TASK_LEN {
        return None;
    }
    Some(trimmed)
}
