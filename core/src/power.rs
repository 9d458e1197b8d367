//! Keeping the host awake while anything is tracked.
//!
//! Monitoring is active exactly when the store is non-empty. The
//! controller only remembers the last value it applied so repeated
//! reconciliation with an unchanged store does nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::PowerError;

/// Persistent "monitoring" notice shown by the host while in background mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundModeConfig {
    pub title: String,
    pub text: String,
    pub icon: String,
    pub color: String,
    pub hidden: bool,
    /// Keeps the notice pinned so the OS does not reclaim the process.
    pub sticky: bool,
}

impl Default for BackgroundModeConfig {
    fn default() -> Self {
        Self {
            title: "SofaTracker active".to_string(),
            text: "Fetching live statistics...".to_string(),
            icon: "icon".to_string(),
            color: "#10b981".to_string(),
            hidden: false,
            sticky: true,
        }
    }
}

/// Screen/CPU wake lock.
pub trait WakeLock: Send + Sync {
    fn keep_awake(&self) -> Result<(), PowerError>;
    fn allow_sleep(&self) -> Result<(), PowerError>;
}

/// Host background-execution switch.
pub trait BackgroundModeBridge: Send + Sync {
    fn enable(&self, config: &BackgroundModeConfig) -> Result<(), PowerError>;
    fn disable(&self) -> Result<(), PowerError>;
    fn is_active(&self) -> bool;
}

pub struct PowerModeController {
    applied: Option<bool>,
    config: BackgroundModeConfig,
    wake_lock: Option<Arc<dyn WakeLock>>,
    background: Option<Arc<dyn BackgroundModeBridge>>,
}

impl PowerModeController {
    /// Either capability may be missing on a given host.
    pub fn new(
        wake_lock: Option<Arc<dyn WakeLock>>,
        background: Option<Arc<dyn BackgroundModeBridge>>,
    ) -> Self {
        Self {
            applied: None,
            config: BackgroundModeConfig::default(),
            wake_lock,
            background,
        }
    }

    /// A controller with no capabilities attached.
    pub fn detached() -> Self {
        Self::new(None, None)
    }

    /// Last applied state, `None` before the first reconcile.
    pub fn monitoring(&self) -> Option<bool> {
        self.applied
    }

    /// Apply `monitoring` if it differs from the last applied value.
    pub fn reconcile(&mut self, monitoring: bool) {
        if self.applied == Some(monitoring) {
            return;
        }
        self.applied = Some(monitoring);
        info!(
            "Monitoring {}",
            if monitoring { "active" } else { "idle" }
        );

        if let Some(lock) = &self.wake_lock {
            let result = if monitoring {
                lock.keep_awake()
            } else {
                lock.allow_sleep()
            };
            if let Err(e) = result {
                warn!("Wake lock update failed: {}", e);
            }
        }

        let Some(bridge) = &self.background else {
            debug!("No background-mode bridge on this host");
            return;
        };
        let result = match (monitoring, bridge.is_active()) {
            (true, false) => bridge.enable(&self.config),
            (false, true) => bridge.disable(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!("Background mode update failed: {}", e);
        }
    }
}
