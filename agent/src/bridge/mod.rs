//! Host capabilities forwarded to the client as JSON-RPC notifications.
//!
//! The agent has no notification tray or wake lock of its own. It asks the
//! connected client to perform those actions through server-initiated
//! notifications on the same NDJSON stream.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use tracing::debug;

use sofatracker_core::errors::{NotifyError, PowerError};
use sofatracker_core::notify::{NativeNotification, NativeScheduler, NotificationChannel};
use sofatracker_core::power::{BackgroundModeBridge, BackgroundModeConfig, WakeLock};

use crate::io::transport::NotificationSender;
use crate::protocol::messages::JsonRpcNotification;

pub const NOTIFICATION_CHANNEL: &str = "notification.channel";
pub const NOTIFICATION_SCHEDULE: &str = "notification.schedule";
pub const POWER_KEEP_AWAKE: &str = "power.keepAwake";
pub const POWER_BACKGROUND_MODE: &str = "power.backgroundMode";

fn send(tx: &NotificationSender, notification: JsonRpcNotification) -> Result<(), String> {
    debug!("Forwarding {} to client", notification.method);
    tx.send(notification)
        .map_err(|_| "client stream closed".to_string())
}

/// Native alert delivery via `notification.schedule`.
pub struct RpcNotificationScheduler {
    tx: NotificationSender,
}

impl RpcNotificationScheduler {
    pub fn new(tx: NotificationSender) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl NativeScheduler for RpcNotificationScheduler {
    async fn prepare(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        let params =
            serde_json::to_value(channel).map_err(|e| NotifyError::Delivery(e.to_string()))?;
        send(&self.tx, JsonRpcNotification::new(NOTIFICATION_CHANNEL, params))
            .map_err(NotifyError::Delivery)
    }

    async fn schedule(&self, notification: &NativeNotification) -> Result<(), NotifyError> {
        let params =
            serde_json::to_value(notification).map_err(|e| NotifyError::Delivery(e.to_string()))?;
        send(&self.tx, JsonRpcNotification::new(NOTIFICATION_SCHEDULE, params))
            .map_err(NotifyError::Delivery)
    }
}

/// Wake lock and background mode via `power.*` notifications.
///
/// The client has no way to answer, so the last requested background state
/// is what [`BackgroundModeBridge::is_active`] reports.
pub struct RpcPowerBridge {
    tx: NotificationSender,
    background: AtomicBool,
}

impl RpcPowerBridge {
    pub fn new(tx: NotificationSender) -> Self {
        Self {
            tx,
            background: AtomicBool::new(false),
        }
    }
}

impl WakeLock for RpcPowerBridge {
    fn keep_awake(&self) -> Result<(), PowerError> {
        send(
            &self.tx,
            JsonRpcNotification::new(POWER_KEEP_AWAKE, json!({"enabled": true})),
        )
        .map_err(PowerError::Bridge)
    }

    fn allow_sleep(&self) -> Result<(), PowerError> {
        send(
            &self.tx,
            JsonRpcNotification::new(POWER_KEEP_AWAKE, json!({"enabled": false})),
        )
        .map_err(PowerError::Bridge)
    }
}

impl BackgroundModeBridge for RpcPowerBridge {
    fn enable(&self, config: &BackgroundModeConfig) -> Result<(), PowerError> {
        send(
            &self.tx,
            JsonRpcNotification::new(
                POWER_BACKGROUND_MODE,
                json!({"enabled": true, "config": config}),
            ),
        )
        .map_err(PowerError::Bridge)?;
        self.background.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable(&self) -> Result<(), PowerError> {
        send(
            &self.tx,
            JsonRpcNotification::new(POWER_BACKGROUND_MODE, json!({"enabled": false})),
        )
        .map_err(PowerError::Bridge)?;
        self.background.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.background.load(Ordering::SeqCst)
    }
}
