//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/wheeldesk/config.json`.  Command-line flags override
//! whatever the file says.
//!
//! # Example
//!
//! ```json
//! {
//!   "bindings": {
//!     "desktop_up": 4,
//!     "desktop_down": 5,
//!     "window_next": 8,
//!     "window_prev": 9
//!   },
//!   "extra_modifier": "alt",
//!   "grab_root": false,
//!   "discovery": { "retries": 3, "backoff_ms": 1000 },
//!   "idle_interval_us": 100,
//!   "sync": true,
//!   "default_window": "x-nautilus-desktop"
//! }
//! ```

use crate::command::ButtonBindings;
use crate::grab::ExtraModifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Window tracked when none is given on the command line.  Always matched
/// by name.
pub const DEFAULT_WINDOW: &str = "x-nautilus-desktop";

/// Top-level configuration.
///
/// Every field is optional: a minimal `{}` file is valid and all fields
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which button triggers which action.
    pub bindings: ButtonBindings,
    /// Also grab every binding while this modifier is held.
    pub extra_modifier: Option<ExtraModifier>,
    /// Grab desktop bindings on the root window instead of relying on
    /// plain event delivery there.
    pub grab_root: bool,
    /// Window lookup retries.
    pub discovery: DiscoveryConfig,
    /// Pause between polls when no event is queued (µs).
    pub idle_interval_us: u64,
    /// Wait for the X server to process each request batch.
    pub sync: bool,
    /// Window tracked when none is given on the command line.
    pub default_window: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bindings: ButtonBindings::default(),
            extra_modifier: None,
            grab_root: false,
            discovery: DiscoveryConfig::default(),
            idle_interval_us: 100,
            sync: true,
            default_window: DEFAULT_WINDOW.to_string(),
        }
    }
}

/// How hard to look for windows that do not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Attempts after the first one.
    pub retries: u32,
    /// Pause between attempts (ms).
    pub backoff_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl DiscoveryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a file that does not exist is
    /// `Ok(None)` rather than an error.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_micros(self.idle_interval_us)
    }
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/wheeldesk`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("wheeldesk")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
