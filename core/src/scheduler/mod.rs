//! Background polling.
//!
//! Interval timing lives in its own tokio task that holds no tracker state
//! and only emits [`Tick`] messages. All work happens on the receiving side
//! (see [`runner::run_poll_loop`]). The tick channel has room for a single
//! pending tick, so a slow cycle coalesces missed ticks instead of queueing
//! a backlog.

pub mod cycle;
pub mod runner;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use cycle::{run_cycle, CycleOutcome, CycleReport, CycleSnapshot, PollTarget, StatUpdate};
pub use runner::run_poll_loop;

/// Shortest period the tick task accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Lightweight wake-up signal from the tick task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

enum State {
    Idle,
    Running {
        interval: Duration,
        cancel: CancellationToken,
        join_handle: JoinHandle<()>,
    },
}

/// `Idle → Running → Idle` tick source.
pub struct PollingScheduler {
    state: State,
}

impl Default for PollingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollingScheduler {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Interval of the running tick task.
    pub fn interval(&self) -> Option<Duration> {
        match &self.state {
            State::Running { interval, .. } => Some(*interval),
            State::Idle => None,
        }
    }

    /// Start ticking every `interval` and return the tick receiver.
    ///
    /// The first tick arrives one full interval after start; callers run
    /// their start-up cycle themselves. A running tick task is replaced.
    pub fn start(&mut self, interval: Duration) -> mpsc::Receiver<Tick> {
        self.stop();

        let interval = if interval < MIN_INTERVAL {
            warn!("Tick interval {:?} too short, using {:?}", interval, MIN_INTERVAL);
            MIN_INTERVAL
        } else {
            interval
        };

        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let join_handle = tokio::spawn(tick_task(interval, tx, cancel.clone()));
        debug!("Tick source started ({}ms)", interval.as_millis());

        self.state = State::Running {
            interval,
            cancel,
            join_handle,
        };
        rx
    }

    /// Halt and tear down the tick task. Idempotent.
    pub fn stop(&mut self) {
        if let State::Running {
            cancel,
            join_handle,
            ..
        } = std::mem::replace(&mut self.state, State::Idle)
        {
            cancel.cancel();
            join_handle.abort();
            debug!("Tick source stopped");
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_task(interval: Duration, tx: mpsc::Sender<Tick>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => match tx.try_send(Tick) {
                Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            },
        }
    }
}
