//! Configuration loading.
//!
//! A TOML file under the platform config directory, overridable with
//! `ROLLCALL_API_URL` and `ROLLCALL_DATA_DIR` environment variables.
//! Missing file means defaults; a malformed file is an error rather than
//! a silent fallback.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default attendance service base URL (local development backend).
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default scan cooldown window in milliseconds.
const DEFAULT_SCAN_COOLDOWN_MS: u64 = 2000;

/// Default scan-gate maximum hold in milliseconds.
const DEFAULT_SCAN_MAX_HOLD_MS: u64 = 15_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the attendance service.
    pub api_url: String,
    /// HTTP request timeout (seconds).
    pub request_timeout_secs: u64,
    /// Debounce window for repeat scans (milliseconds).
    pub scan_cooldown_ms: u64,
    /// Scan-gate reclaim bound for hung submissions (milliseconds).
    pub scan_max_hold_ms: u64,
    /// Where the local store lives; platform data dir when unset.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            scan_cooldown_ms: DEFAULT_SCAN_COOLDOWN_MS,
            scan_max_hold_ms: DEFAULT_SCAN_MAX_HOLD_MS,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)?;
                toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("bad config at {}: {e}", path.display()))?
            }
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("ROLLCALL_API_URL") {
            if !url.is_empty() {
                config.api_url = url;
            }
        }
        if let Ok(dir) = std::env::var("ROLLCALL_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        Ok(config)
    }

    /// Path of the config file, when a platform config dir exists.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "rollcall")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolve (and create) the directory holding the local store.
    pub fn resolve_data_dir(&self) -> anyhow::Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => directories::ProjectDirs::from("", "", "rollcall")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| anyhow::anyhow!("no home directory; set data_dir"))?,
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scan_cooldown(&self) -> Duration {
        Duration::from_millis(self.scan_cooldown_ms)
    }

    pub fn scan_max_hold(&self) -> Duration {
        Duration::from_millis(self.scan_max_hold_ms)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
