//! Configuration loading for tally.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.tally/config.toml` under the host's data directory)
//! 3. User config (`~/.tally/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists, and a malformed file degrades to defaults with a
//! warning rather than an error.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Module;
use crate::error::{Result, TallyError};

/// Environment variable overriding the sync interval, in seconds.
pub const ENV_SYNC_INTERVAL: &str = "TALLY_SYNC_INTERVAL";

/// Main configuration struct for tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Synchronization cadence configuration.
    pub sync: SyncConfig,
    /// Per-module enable/disable configuration.
    pub modules: ModulesConfig,
}

/// Synchronization cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between scheduler firings.
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Per-module enable/disable configuration.
///
/// Every module is enabled unless an override says otherwise. Hook modules
/// use the same table; a disabled hook module is skipped during hook loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModulesConfig {
    /// Per-module enable/disable overrides, keyed by module name.
    pub overrides: HashMap<String, bool>,
}

impl ModulesConfig {
    /// Check whether a module is enabled.
    pub fn enabled(&self, module: Module) -> bool {
        self.overrides.get(module.as_str()).copied().unwrap_or(true)
    }

    /// Disable a module. Used by the host and by tests to build configs.
    pub fn disable(&mut self, module: Module) {
        self.overrides.insert(module.as_str().to_string(), false);
    }
}

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// `project_dir` is the host's data directory; `.tally/config.toml`
    /// beneath it takes precedence over the user-level file. Missing files
    /// are fine; malformed files log a warning and fall back to the next
    /// layer.
    pub fn load(project_dir: &Path) -> Self {
        let mut config = load_file(&project_config_path(project_dir))
            .or_else(|| user_config_path().and_then(|path| load_file(&path)))
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Apply environment variable overrides.
    fn apply_env(&mut self) {
        if let Ok(raw) = env::var(ENV_SYNC_INTERVAL) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.sync.interval_secs = secs,
                _ => {
                    tracing::warn!(
                        "{} is not a positive integer ({:?}), ignoring",
                        ENV_SYNC_INTERVAL,
                        raw
                    );
                }
            }
        }
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TallyError::config(e.to_string()))
    }
}

/// Path to the project-level config file.
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".tally").join("config.toml")
}

/// Path to the user-level config file, if a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tally").join("config.toml"))
}

/// Load and parse a config file, logging and skipping on any failure.
fn load_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        return None;
    }
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!("failed to read config {}: {}", path.display(), err);
            return None;
        }
    };
    match Config::from_toml(&raw) {
        Ok(config) => Some(config),
        Err(err) => {
            tracing::warn!("ignoring malformed config {}: {}", path.display(), err);
            None
        }
    }
}
