//! Fixed-interval auto refresh.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::debug;

use crate::errors::ClientError;

/// Running poller; stops when dropped.
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        // Drop does the work.
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Calls `tick` now and then every `period`.
///
/// Each tick is awaited before the next one is scheduled, so two ticks never
/// overlap; a slow tick delays the following ones instead of stacking up.
pub fn spawn_poller<F, Fut>(period: Duration, mut tick: F) -> PollerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = ticker(period);
        let mut count: u64 = 0;
        loop {
            ticker.tick().await;
            count += 1;
            debug!(count, "Poll tick");
            tick().await;
        }
    });
    PollerHandle { task }
}

/// Re-runs `fetch` every `period` and hands each result to `publish`.
///
/// Used by the pages that only display a feed (scoreboard, shop orders).
/// Errors are published too; the watcher keeps running until dropped.
pub fn watch<T, F, Fut, P>(period: Duration, mut fetch: F, mut publish: P) -> PollerHandle
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    P: FnMut(Result<T, ClientError>) + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            ticker.tick().await;
            let result = fetch().await;
            if let Err(err) = &result {
                debug!(error = %err, "Watched fetch failed");
            }
            publish(result);
        }
    });
    PollerHandle { task }
}
