mod config;
pub mod database;
mod kv;
pub mod migrations;

pub use config::{
    AnalyticsConfig, Config, HistoryConfig, MAX_ACTIVITY_WINDOW_DAYS, MAX_HEATMAP_WEEKS,
};
pub use database::Database;
pub use kv::{KeyValueStore, MemoryStore};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the directory holding the database and `config.toml`.
///
/// `STUDYLOG_DATA_DIR` wins when set. Otherwise `~/.config/studylog[-dev]/`
/// based on `STUDYLOG_ENV` (set it to `dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYLOG_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("STUDYLOG_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("studylog-dev")
            } else {
                base_dir.join("studylog")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
