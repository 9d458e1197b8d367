//! In-memory alert list with a fixed display window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, warn};

use super::{NativeNotification, NativeScheduler, NotificationEvent, ALERT_CHANNEL_ID};

/// Holds the alerts currently on screen, newest first, and forwards each
/// alert to the native scheduler.
///
/// Forwarding is best-effort and detached: a failing or slow scheduler
/// never affects the in-memory list.
pub struct NotificationCenter {
    active: Vec<NotificationEvent>,
    ttl: chrono::Duration,
    native_delay: chrono::Duration,
    scheduler: Option<Arc<dyn NativeScheduler>>,
}

impl NotificationCenter {
    pub fn new(
        ttl: Duration,
        native_delay: Duration,
        scheduler: Option<Arc<dyn NativeScheduler>>,
    ) -> Self {
        Self {
            active: Vec::new(),
            ttl: to_chrono(ttl),
            native_delay: to_chrono(native_delay),
            scheduler,
        }
    }

    /// Show `event` and hand it to the native scheduler.
    pub fn push(&mut self, event: NotificationEvent) {
        self.prune(event.created_at);
        self.forward(&event);
        self.active.insert(0, event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = NotificationEvent>) {
        for event in events {
            self.push(event);
        }
    }

    /// Drop alerts whose display window ended at or before `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.active.retain(|e| {
            e.created_at
                .checked_add_signed(ttl)
                .map_or(true, |end| end > now)
        });
    }

    /// Alerts still on screen at `now`, newest first.
    pub fn active(&mut self, now: DateTime<Utc>) -> &[NotificationEvent] {
        self.prune(now);
        &self.active
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    fn forward(&self, event: &NotificationEvent) {
        let Some(scheduler) = self.scheduler.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, skipping native notification {}", event.id);
            return;
        };

        let now = Utc::now();
        let native = NativeNotification {
            id: rand::thread_rng().gen_range(0..1_000_000),
            title: event.title.clone(),
            body: event.message.clone(),
            at: now.checked_add_signed(self.native_delay).unwrap_or(now),
            channel_id: ALERT_CHANNEL_ID.to_string(),
        };
        handle.spawn(async move {
            if let Err(e) = scheduler.schedule(&native).await {
                warn!("Native notification {} not scheduled: {}", native.id, e);
            }
        });
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
