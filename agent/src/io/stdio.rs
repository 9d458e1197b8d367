use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sofatracker_core::config::TrackerConfig;
use sofatracker_core::engine::{Tracker, TrackerHandle};
use sofatracker_core::notify::{NativeScheduler, NotificationCenter, NotificationChannel};
use sofatracker_core::power::PowerModeController;
use sofatracker_core::scheduler::run_poll_loop;
use sofatracker_core::tracking::TrackedEntityStore;

use crate::bridge::{RpcNotificationScheduler, RpcPowerBridge};
use crate::handler::dispatch::Dispatcher;
use crate::http::HttpStatsSource;
use crate::io::transport::{run_transport_loop, NotificationSender};
use crate::state::persistence::JsonFileBackend;

/// Assemble the tracker with the HTTP source, the on-disk store and the
/// client-backed capabilities.
pub async fn build_tracker(
    config: TrackerConfig,
    notification_tx: NotificationSender,
) -> anyhow::Result<TrackerHandle> {
    let source = HttpStatsSource::new(config.api_base.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;
    info!("Stats backend: {}", source.api_base());

    let state_dir = config.resolved_state_dir();
    info!("State directory: {}", state_dir.display());
    let store = TrackedEntityStore::load(Box::new(JsonFileBackend::new(state_dir)));

    let scheduler = Arc::new(RpcNotificationScheduler::new(notification_tx.clone()));
    if let Err(e) = scheduler.prepare(&NotificationChannel::default()).await {
        warn!("Alert channel not registered: {}", e);
    }

    let power = Arc::new(RpcPowerBridge::new(notification_tx));
    let notifications = NotificationCenter::new(
        config.notification_ttl(),
        config.native_delay(),
        Some(scheduler),
    );
    let tracker = Tracker::new(
        config,
        store,
        notifications,
        PowerModeController::new(Some(power.clone()), Some(power)),
    );
    Ok(TrackerHandle::new(tracker, Arc::new(source)))
}

/// Run the agent over stdin/stdout.
///
/// Polling starts immediately and stops when stdin closes.
pub async fn run_stdio_loop(config: TrackerConfig) -> anyhow::Result<()> {
    let (notification_tx, mut notification_rx) = unbounded_channel();
    let handle = build_tracker(config, notification_tx).await?;

    let shutdown = CancellationToken::new();
    let poller = tokio::spawn(run_poll_loop(handle.clone(), shutdown.clone()));
    let mut dispatcher = Dispatcher::new(handle);

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    info!("Stdio transport loop started, waiting for input");
    let result = run_transport_loop(
        &mut reader,
        &mut stdout,
        &mut dispatcher,
        &mut notification_rx,
        shutdown.clone(),
    )
    .await;

    info!("Stdin closed, shutting down");
    shutdown.cancel();
    if let Err(e) = poller.await {
        warn!("Poll loop ended abnormally: {}", e);
    }
    result
}
