use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::storage::FileStore;

/// Application configuration loaded from environment variables.
/// Every setting has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Root of the key-value store.
    pub data_dir: PathBuf,
    /// Where exported images, print documents and backups are written.
    pub export_dir: PathBuf,
    pub presets_path: Option<PathBuf>,
    pub persist_debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = optional_env("STUDIO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(FileStore::default_root);
        let export_dir = optional_env("STUDIO_EXPORT_DIR")
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| data_dir.join("exports"));

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            data_dir,
            export_dir,
            presets_path: optional_env("STUDIO_PRESETS").map(PathBuf::from),
            persist_debounce: Duration::from_millis(
                optional_env("STUDIO_PERSIST_DEBOUNCE_MS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("STUDIO_PERSIST_DEBOUNCE_MS must be a number of milliseconds")?
                    .unwrap_or(500),
            ),
        })
    }

    /// Defaults rooted at `dir`, for tests.
    #[cfg(test)]
    pub fn for_dir(dir: &std::path::Path) -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            data_dir: dir.join("data"),
            export_dir: dir.join("exports"),
            presets_path: None,
            persist_debounce: Duration::from_millis(500),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
