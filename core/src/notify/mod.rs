//! Alerts: delta detection, the transient in-memory list, and the native
//! scheduling capability alerts are forwarded to.

pub mod center;
pub mod delta;

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::NotifyError;

pub use center::NotificationCenter;
pub use delta::compare;

/// Channel every alert is posted on.
pub const ALERT_CHANNEL_ID: &str = "sofatracker_alerts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

/// An alert shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Unique, strictly increasing, derived from the creation time in ms.
    pub id: u64,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

static LAST_ID: AtomicU64 = AtomicU64::new(0);

fn next_id(now: DateTime<Utc>) -> u64 {
    let millis = now.timestamp_millis().max(0) as u64;
    let mut prev = LAST_ID.load(Ordering::Relaxed);
    loop {
        let id = millis.max(prev + 1);
        match LAST_ID.compare_exchange_weak(prev, id, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return id,
            Err(actual) => prev = actual,
        }
    }
}

impl NotificationEvent {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self::at(title, message, severity, Utc::now())
    }

    pub fn at(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: next_id(created_at),
            title: title.into(),
            message: message.into(),
            severity,
            created_at,
        }
    }
}

/// Registration details for the alert channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    /// 1 (min) to 5 (max).
    pub importance: u8,
    pub vibration: bool,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self {
            id: ALERT_CHANNEL_ID.to_string(),
            name: "Player alerts".to_string(),
            description: "Important in-match events for tracked players".to_string(),
            importance: 5,
            vibration: true,
        }
    }
}

/// A request handed to the host's notification scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeNotification {
    /// Host-side id, random in `0..1_000_000`.
    pub id: u32,
    pub title: String,
    pub body: String,
    /// Requested delivery time.
    pub at: DateTime<Utc>,
    pub channel_id: String,
}

/// Fire-and-forget native notification delivery.
#[async_trait::async_trait]
pub trait NativeScheduler: Send + Sync {
    /// Request permission and register `channel`. Called once at startup.
    async fn prepare(&self, _channel: &NotificationChannel) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn schedule(&self, notification: &NativeNotification) -> Result<(), NotifyError>;
}
