//! Drives poll cycles from the tick source until shutdown.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::PollingScheduler;
use crate::engine::TrackerHandle;

/// Poll immediately, then once per tick until `shutdown` fires.
///
/// The interval follows the tracker's demo flag: after any cycle that
/// flipped it, the tick source is restarted with the new interval. Cycles
/// never overlap because ticks are consumed on this task only.
pub async fn run_poll_loop(handle: TrackerHandle, shutdown: CancellationToken) {
    let mut scheduler = PollingScheduler::new();
    let mut interval = handle.lock().await.poll_interval();
    let mut ticks = scheduler.start(interval);
    info!("Polling every {}ms", interval.as_millis());

    handle.poll_once().await;

    loop {
        let wanted = handle.lock().await.poll_interval();
        if wanted != interval {
            debug!(
                "Poll interval {}ms -> {}ms",
                interval.as_millis(),
                wanted.as_millis()
            );
            interval = wanted;
            ticks = scheduler.start(interval);
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            tick = ticks.recv() => match tick {
                Some(_) => {
                    handle.poll_once().await;
                }
                None => break,
            },
        }
    }

    scheduler.stop();
    info!("Polling stopped");
}
