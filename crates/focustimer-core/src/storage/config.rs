//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default phase durations used when no saved durations exist
//! - Alert preferences (sound, haptic)
//! - Analytics opt-out
//! - Micro-sprint presets and status message timing
//! - Keyboard shortcuts
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{Durations, StatusTtl};

/// Default durations in minutes, clamped to phase bounds on use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub haptic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroSprintConfig {
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
}

/// How long transient status messages stay visible, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_completion_secs")]
    pub completion_secs: u64,
    #[serde(default = "default_sprint_secs")]
    pub sprint_secs: u64,
}

/// Keyboard shortcuts configuration: key → action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutsConfig {
    #[serde(default = "default_bindings")]
    pub bindings: BTreeMap<String, String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub micro_sprint: MicroSprintConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub shortcuts: ShortcutsConfig,
}

// Default functions
fn default_work() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_true() -> bool {
    true
}
fn default_presets() -> Vec<u32> {
    vec![5, 10]
}
fn default_completion_secs() -> u64 {
    5
}
fn default_sprint_secs() -> u64 {
    3
}
fn default_bindings() -> BTreeMap<String, String> {
    [
        (" ", "toggle"),
        ("r", "reset"),
        ("s", "skip"),
        ("5", "sprint:5"),
        ("t", "sprint:10"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            work: default_work(),
            short_break: default_short_break(),
            long_break: default_long_break(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            sound: true,
            haptic: true,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for MicroSprintConfig {
    fn default() -> Self {
        Self {
            presets: default_presets(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            completion_secs: default_completion_secs(),
            sprint_secs: default_sprint_secs(),
        }
    }
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config path inside the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default path, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Durations used when the settings store has none saved.
    pub fn default_durations(&self) -> Durations {
        Durations::from_minutes(
            i64::from(self.defaults.work),
            i64::from(self.defaults.short_break),
            i64::from(self.defaults.long_break),
        )
    }

    pub fn status_ttl(&self) -> StatusTtl {
        StatusTtl {
            completion_ms: self.status.completion_secs.saturating_mul(1000),
            sprint_ms: self.status.sprint_secs.saturating_mul(1000),
        }
    }

    /// Whether a phase-complete alert should be raised at all.
    pub fn alerts_enabled(&self) -> bool {
        self.notifications.sound || self.notifications.haptic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.notifications.sound);
        assert_eq!(parsed.micro_sprint.presets, vec![5, 10]);
        assert_eq!(parsed.shortcuts.bindings.get(" ").map(String::as_str), Some("toggle"));
    }

    #[test]
    fn empty_file_gets_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.defaults.work, 25);
        assert!(parsed.analytics.enabled);
        assert_eq!(parsed.status.completion_secs, 5);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.sound").as_deref(), Some("true"));
        assert_eq!(cfg.get("defaults.work").as_deref(), Some("25"));
        assert!(cfg.get("notifications.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("analytics.enabled", "false").unwrap();
        cfg.set("defaults.long_break", "20").unwrap();
        cfg.set("micro_sprint.presets", "[3, 7]").unwrap();
        assert!(!cfg.analytics.enabled);
        assert_eq!(cfg.defaults.long_break, 20);
        assert_eq!(cfg.micro_sprint.presets, vec![3, 7]);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("ui.theme", "dark"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("notifications.sound", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("defaults.work", "-1").is_err());
    }

    #[test]
    fn default_durations_are_clamped() {
        let mut cfg = Config::default();
        cfg.defaults.work = 500;
        cfg.defaults.long_break = 1;
        let d = cfg.default_durations();
        assert_eq!(d.get(Phase::Work), 90 * 60);
        assert_eq!(d.get(Phase::LongBreak), 5 * 60);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.defaults.short_break, 5);
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.notifications.haptic = false;
        changed.save_to(&path).unwrap();
        assert!(!Config::load_from(&path).unwrap().notifications.haptic);
    }

    #[test]
    fn load_from_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "defaults = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
