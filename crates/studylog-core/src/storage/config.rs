//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - History retention (how many study records are kept)
//! - Analytics thresholds (weakness ranking, activity window, heatmap size)
//! - Fallback radar categories
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::records::DEFAULT_HISTORY_CAP;

/// Largest accepted `analytics.heatmap_weeks` (ten years).
pub const MAX_HEATMAP_WEEKS: u32 = 520;
/// Largest accepted `analytics.activity_window_days` (ten years).
pub const MAX_ACTIVITY_WINDOW_DAYS: u32 = 3660;

/// Study history retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

/// Analytics thresholds and fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Subjects with fewer answers are left out of the weakness ranking.
    #[serde(default = "default_weakness_min_answers")]
    pub weakness_min_answers: u64,
    #[serde(default = "default_weakness_limit")]
    pub weakness_limit: usize,
    /// Trailing window of the daily activity histogram.
    #[serde(default = "default_activity_window_days")]
    pub activity_window_days: u32,
    #[serde(default = "default_heatmap_weeks")]
    pub heatmap_weeks: u32,
    /// Radar axes used when neither banks nor history name a subject.
    #[serde(default = "default_fallback_categories")]
    pub fallback_categories: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

// Default functions
fn default_max_records() -> usize {
    DEFAULT_HISTORY_CAP
}
fn default_weakness_min_answers() -> u64 {
    5
}
fn default_weakness_limit() -> usize {
    5
}
fn default_activity_window_days() -> u32 {
    7
}
fn default_heatmap_weeks() -> u32 {
    12
}
fn default_fallback_categories() -> Vec<String> {
    ["憲法", "民法", "行政法", "商法", "基礎法学", "一般知識"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            weakness_min_answers: default_weakness_min_answers(),
            weakness_limit: default_weakness_limit(),
            activity_window_days: default_activity_window_days(),
            heatmap_weeks: default_heatmap_weeks(),
            fallback_categories: default_fallback_categories(),
        }
    }
}

impl AnalyticsConfig {
    /// Reject window sizes the date arithmetic cannot represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |key: &str, value: u32, max: u32| {
            if (1..=max).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("must be between 1 and {max}, got {value}"),
                })
            }
        };
        check("analytics.heatmap_weeks", self.heatmap_weeks, MAX_HEATMAP_WEEKS)?;
        check(
            "analytics.activity_window_days",
            self.activity_window_days,
            MAX_ACTIVITY_WINDOW_DAYS,
        )
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
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
                    serde_json::Value::Array(_) => serde_json::Value::Array(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(|s| serde_json::Value::String(s.to_string()))
                            .collect(),
                    ),
                    serde_json::Value::Object(_) => {
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

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit file, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json)?;
        updated.analytics.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
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
        assert_eq!(parsed.history.max_records, 1000);
        assert_eq!(parsed.analytics.weakness_min_answers, 5);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[analytics]\nweakness_limit = 3\n").unwrap();
        assert_eq!(parsed.analytics.weakness_limit, 3);
        assert_eq!(parsed.analytics.activity_window_days, 7);
        assert_eq!(parsed.history.max_records, 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("history.max_records").as_deref(), Some("1000"));
        assert_eq!(cfg.get("analytics.heatmap_weeks").as_deref(), Some("12"));
        assert!(cfg.get("analytics.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_number_and_list() {
        let mut cfg = Config::default();
        cfg.set("analytics.weakness_min_answers", "10").unwrap();
        assert_eq!(cfg.analytics.weakness_min_answers, 10);

        cfg.set("analytics.fallback_categories", "英語, 数学").unwrap();
        assert_eq!(cfg.analytics.fallback_categories, vec!["英語", "数学"]);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("analytics.nonexistent_key", "1").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn set_rejects_invalid_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "history.max_records", "lots");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn set_rejects_out_of_range_windows() {
        let mut cfg = Config::default();
        let err = cfg.set("analytics.heatmap_weeks", "100000000").unwrap_err();
        assert!(err.to_string().contains("analytics.heatmap_weeks"));
        assert!(cfg.set("analytics.activity_window_days", "4294967295").is_err());
        assert!(cfg.set("analytics.heatmap_weeks", "0").is_err());
        assert_eq!(cfg, Config::default());

        cfg.set("analytics.heatmap_weeks", "520").unwrap();
        assert_eq!(cfg.analytics.heatmap_weeks, MAX_HEATMAP_WEEKS);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.set("history.max_records", "50").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().history.max_records, 50);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "history = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
