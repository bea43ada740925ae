//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The time zone days are counted in
//! - The daily task catalog and unlock levels
//! - Milestone messages and badge thresholds
//! - Reminder time
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::calendar::DayZone;
use crate::celebration::{default_badges, Badge, MilestoneTable};
use crate::checklist::{default_catalog, validate_catalog, TaskTemplate};
use crate::error::{ConfigError, ValidationError};
use crate::reminder::ReminderSettings;

/// Calendar configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Fixed offset east of UTC in minutes. Unset means the system zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Daily task catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistConfig {
    #[serde(default = "default_catalog")]
    pub tasks: Vec<TaskTemplate>,
}

/// Badge definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgesConfig {
    #[serde(default = "default_badges")]
    pub thresholds: Vec<Badge>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub reminders: ReminderSettings,
    #[serde(default)]
    pub checklist: ChecklistConfig,
    #[serde(default)]
    pub celebration: MilestoneTable,
    #[serde(default)]
    pub badges: BadgesConfig,
}

impl Default for ChecklistConfig {
    fn default() -> Self {
        Self {
            tasks: default_catalog(),
        }
    }
}

impl Default for BadgesConfig {
    fn default() -> Self {
        Self {
            thresholds: default_badges(),
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as integer")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Unset optional: accept JSON literals, "none" clears.
                    serde_json::Value::Null => match value {
                        "none" | "null" => serde_json::Value::Null,
                        _ => serde_json::from_str(value)
                            .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                    },
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate().map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
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

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Set a config value by key without saving. The result must still
    /// validate, otherwise `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_catalog(&self.checklist.tasks)?;
        self.reminders.validate()?;
        self.day_zone()?;
        Ok(())
    }

    pub fn day_zone(&self) -> Result<DayZone, ValidationError> {
        DayZone::from_offset_minutes(self.calendar.utc_offset_minutes)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [calendar]
            utc_offset_minutes = -300

            [[checklist.tasks]]
            id = "verse"
            title = "Read the verse"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.calendar.utc_offset_minutes, Some(-300));
        assert_eq!(parsed.checklist.tasks.len(), 1);
        assert_eq!(parsed.checklist.tasks[0].minimum_streak_day, 0);
        assert_eq!(parsed.reminders, ReminderSettings::default());
        assert_eq!(parsed.badges, BadgesConfig::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("reminders.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("reminders.hour").as_deref(), Some("8"));
        assert_eq!(cfg.get("calendar.utc_offset_minutes").as_deref(), Some("null"));
        assert!(cfg.get("reminders.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("reminders.hour", "21").unwrap();
        cfg.apply("reminders.enabled", "false").unwrap();
        cfg.apply("celebration.generic_message", "{n} days!").unwrap();
        assert_eq!(cfg.reminders.hour, 21);
        assert!(!cfg.reminders.enabled);
        assert_eq!(cfg.celebration.message_for(9), "9 days!");
    }

    #[test]
    fn apply_sets_and_clears_optional_offset() {
        let mut cfg = Config::default();
        cfg.apply("calendar.utc_offset_minutes", "120").unwrap();
        assert_eq!(cfg.calendar.utc_offset_minutes, Some(120));
        // Once set the field is a number; clearing goes through the table form.
        assert!(cfg.apply("calendar.utc_offset_minutes", "none").is_err());
        cfg.apply("calendar", r#"{"utc_offset_minutes": null}"#).unwrap();
        assert_eq!(cfg.calendar.utc_offset_minutes, None);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("reminders.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.apply("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_type_and_value() {
        let mut cfg = Config::default();
        assert!(cfg.apply("reminders.enabled", "not_a_bool").is_err());
        assert!(cfg.apply("reminders.hour", "25").is_err());
        assert!(cfg.apply("checklist.tasks", "[]").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.apply("reminders.minute", "45").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().reminders.minute, 45);
    }

    #[test]
    fn load_from_rejects_invalid_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [[checklist.tasks]]
            id = "a"
            title = "A"

            [[checklist.tasks]]
            id = "a"
            title = "A again"
            "#,
        )
        .unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn day_zone_follows_offset() {
        let mut cfg = Config::default();
        assert_eq!(cfg.day_zone().unwrap(), DayZone::Local);
        cfg.calendar.utc_offset_minutes = Some(60);
        assert!(matches!(cfg.day_zone().unwrap(), DayZone::Fixed(_)));
    }
}
