//! Tracker configuration.
//!
//! Loaded once at startup from `config.json` in the platform config
//! directory. Every field has a default so an empty or partial file is
//! valid; a missing or corrupt file yields [`TrackerConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Environment variable that overrides [`TrackerConfig::api_base`].
pub const API_BASE_ENV: &str = "SOFATRACKER_API_BASE";

/// Directory name used under the platform config directory.
const APP_DIR: &str = "sofatracker";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Base URL of the live-stats backend.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Poll interval while real data is available.
    #[serde(default = "default_live_interval_ms")]
    pub live_interval_ms: u64,
    /// Poll interval while running on synthetic demo data.
    #[serde(default = "default_demo_interval_ms")]
    pub demo_interval_ms: u64,
    /// How long a notification stays in the in-memory list.
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,
    /// Delay before a native notification is delivered.
    #[serde(default = "default_native_delay_ms")]
    pub native_delay_ms: u64,
    /// Per-request timeout for the HTTP data source.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Where persisted state lives; `None` means the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            live_interval_ms: default_live_interval_ms(),
            demo_interval_ms: default_demo_interval_ms(),
            notification_ttl_ms: default_notification_ttl_ms(),
            native_delay_ms: default_native_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            state_dir: None,
        }
    }
}

impl TrackerConfig {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Self {
        Self::load_from(&config_dir().join("config.json")).with_env_overrides()
    }

    /// Apply `SOFATRACKER_API_BASE` if set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                debug!("{} overrides apiBase", API_BASE_ENV);
                self.api_base = base;
            }
        }
        self
    }

    /// Load from a specific path. Missing or corrupt files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<TrackerConfig>(&contents) {
                Ok(config) => {
                    debug!("Loaded tracker config from {}", path.display());
                    config.validated()
                }
                Err(e) => {
                    warn!("Failed to parse config from {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Replace zero poll intervals with their defaults.
    pub fn validated(mut self) -> Self {
        if self.live_interval_ms == 0 {
            warn!("liveIntervalMs must be positive, using {}", default_live_interval_ms());
            self.live_interval_ms = default_live_interval_ms();
        }
        if self.demo_interval_ms == 0 {
            warn!("demoIntervalMs must be positive, using {}", default_demo_interval_ms());
            self.demo_interval_ms = default_demo_interval_ms();
        }
        self
    }

    /// Poll interval for the given mode. A zero setting maps to the default.
    pub fn poll_interval(&self, demo: bool) -> Duration {
        let ms = match (demo, self.demo_interval_ms, self.live_interval_ms) {
            (true, 0, _) => default_demo_interval_ms(),
            (true, ms, _) => ms,
            (false, _, 0) => default_live_interval_ms(),
            (false, _, ms) => ms,
        };
        Duration::from_millis(ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn native_delay(&self) -> Duration {
        Duration::from_millis(self.native_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Directory holding persisted state.
    pub fn resolved_state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(config_dir)
    }
}

/// Platform config directory for the tracker.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join(APP_DIR);
    }
    if let Ok(home) = std::env::var("HOME") {
        #[cfg(target_os = "macos")]
        return PathBuf::from(&home)
            .join("Library")
            .join("Application Support")
            .join(APP_DIR);
        #[cfg(not(target_os = "macos"))]
        return PathBuf::from(&home).join(".config").join(APP_DIR);
    }
    PathBuf::from(".config").join(APP_DIR)
}

fn default_api_base() -> String {
    "https://backend-sofa-production.up.railway.app".to_string()
}

fn default_live_interval_ms() -> u64 {
    15_000
}

fn default_demo_interval_ms() -> u64 {
    5_000
}

fn default_notification_ttl_ms() -> u64 {
    5_000
}

fn default_native_delay_ms() -> u64 {
    1_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}
