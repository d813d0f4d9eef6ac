//! TOML-based user settings.
//!
//! Stored at `<data_dir>/config.toml`:
//!
//! ```toml
//! [timer]
//! work_minutes = 25
//! short_break_minutes = 5
//! long_break_minutes = 15
//! long_break_every = 4
//! # optional, added to the minutes of the same phase
//! work_seconds = 0
//! short_break_seconds = 0
//! long_break_seconds = 0
//! tick_interval_ms = 1000
//!
//! [notifications]
//! bell = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use pomocycle_core::{ConfigError, Configuration, Preset};
use serde::{Deserialize, Serialize};

use super::data_dir;

const MINUTE_MS: u64 = 60 * 1000;

/// Durations and cadence for the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u64,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u64,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u64,
    #[serde(default)]
    pub work_seconds: u64,
    #[serde(default)]
    pub short_break_seconds: u64,
    #[serde(default)]
    pub long_break_seconds: u64,
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// How phase completion is announced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Ring the terminal bell when a phase ends.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

fn default_work_minutes() -> u64 {
    25
}
fn default_short_break_minutes() -> u64 {
    5
}
fn default_long_break_minutes() -> u64 {
    15
}
fn default_long_break_every() -> u32 {
    4
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

fn phase_secs(minutes: u64, seconds: u64) -> u64 {
    minutes.saturating_mul(60).saturating_add(seconds)
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            work_seconds: 0,
            short_break_seconds: 0,
            long_break_seconds: 0,
            long_break_every: default_long_break_every(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { bell: true }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    /// Replace the leaf at `key`, parsing `value` as the leaf's existing type.
    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err("config key is empty".into());
        }

        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent
                    .get_mut(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
            }
        }
        let obj = parent
            .as_object_mut()
            .ok_or_else(|| format!("unknown config key: {key}"))?;
        let existing = obj
            .get(leaf)
            .ok_or_else(|| format!("unknown config key: {key}"))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| format!("cannot parse '{value}' as bool for {key}"))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(n) = value.parse::<i64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    return Err(format!("cannot parse '{value}' as a whole number for {key}").into());
                }
            }
            serde_json::Value::Object(_) => {
                return Err(format!("{key} is a section, set one of its keys instead").into())
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// `<data_dir>/config.toml`
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if nothing exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// defaults cannot be written.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings: Settings = toml::from_str(&content)?;
                settings.validate()?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get a value as a string by dot-separated key, e.g. `timer.work_minutes`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. The result is validated before it
    /// replaces `self`, so a rejected value leaves the settings untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse as
    /// the key's type, or the resulting timer configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Settings = serde_json::from_value(json)
            .map_err(|e| format!("invalid value '{value}' for {key}: {e}"))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check everything a `Configuration` and a tick source will need.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.configuration()?;
        self.tick_interval()?;
        Ok(())
    }

    pub fn configuration(&self) -> Result<Configuration, ConfigError> {
        Configuration::from_secs(
            phase_secs(self.timer.work_minutes, self.timer.work_seconds),
            phase_secs(self.timer.short_break_minutes, self.timer.short_break_seconds),
            phase_secs(self.timer.long_break_minutes, self.timer.long_break_seconds),
            self.timer.long_break_every,
        )
    }

    pub fn tick_interval(&self) -> Result<Duration, Box<dyn std::error::Error>> {
        if self.timer.tick_interval_ms == 0 {
            return Err("timer.tick_interval_ms must be greater than zero".into());
        }
        Ok(Duration::from_millis(self.timer.tick_interval_ms))
    }

    /// Overwrite the phase durations and cadence with a preset's.
    pub fn apply_preset(&mut self, preset: Preset) {
        let cfg = preset.configuration();
        self.timer.work_minutes = cfg.work_duration_ms() / MINUTE_MS;
        self.timer.short_break_minutes = cfg.short_break_duration_ms() / MINUTE_MS;
        self.timer.long_break_minutes = cfg.long_break_duration_ms() / MINUTE_MS;
        self.timer.work_seconds = 0;
        self.timer.short_break_seconds = 0;
        self.timer.long_break_seconds = 0;
        self.timer.long_break_every = cfg.long_break_every();
    }
}
