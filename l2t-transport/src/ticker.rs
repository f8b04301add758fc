//! Exponential backoff ticker used to schedule retransmissions.
//!
//! A [`Ticker`] runs a fixed-period heartbeat of interval `d` in a background
//! task and emits a tick whenever the heartbeat count is zero or a power of
//! two.  Ticks therefore land at `0, d, 2d, 4d, 8d, ...` measured from the
//! moment the ticker was started.  The heartbeat itself never stretches, so
//! the schedule stays anchored to the start instant no matter how late the
//! consumer is.
//!
//! Delivery goes through a single overwriting slot: a new tick replaces one
//! that has not been consumed yet.  A slow consumer never sees a backlog and
//! always gets the latest tick that came due.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest heartbeat accepted; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A running backoff ticker.  Dropping it stops the background task.
#[derive(Debug)]
pub struct Ticker {
    rx: watch::Receiver<Option<Instant>>,
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start a ticker whose first tick is due immediately and whose gaps
    /// double after the first interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let stop = CancellationToken::new();
        let handle = tokio::spawn(heartbeat(interval.max(MIN_INTERVAL), tx, stop.clone()));
        Self {
            rx,
            stop,
            handle: Some(handle),
        }
    }

    /// Wait for the next tick.  Returns the scheduled instant of the latest
    /// tick due, or `None` once the ticker has been stopped.
    pub async fn tick(&mut self) -> Option<Instant> {
        if self.is_stopped() {
            return None;
        }
        self.rx.changed().await.ok()?;
        *self.rx.borrow_and_update()
    }

    /// Take a pending tick without waiting.
    pub fn try_tick(&mut self) -> Option<Instant> {
        if self.is_stopped() || !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        *self.rx.borrow_and_update()
    }

    /// Permanently halt the ticker.  Pending ticks are discarded and no tick
    /// is delivered afterwards.  Calling it again is a no-op.
    pub fn stop(&mut self) {
        self.stop.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn heartbeat(
    interval: Duration,
    tx: watch::Sender<Option<Instant>>,
    stop: CancellationToken,
) {
    let mut beat = tokio::time::interval(interval);
    // Burst keeps every heartbeat on its original slot, so counts stay exact.
    beat.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut count: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            at = beat.tick() => {
                if count == 0 || count.is_power_of_two() {
                    if tx.is_closed() {
                        break;
                    }
                    // Overwrites a tick the consumer has not taken yet.
                    tx.send_replace(Some(at));
                    log::trace!("[ticker] heartbeat #{count} due");
                }
                count += 1;
            }
        }
    }
}
