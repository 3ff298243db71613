use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::FeedSource;
use crate::events::AppEvent;

/// Fixed feed cadence.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Background task that refreshes the feed once immediately and then on a
/// fixed interval, reporting each cycle over the app event channel.
///
/// Dropping the scheduler (or calling [`RefreshScheduler::stop`]) aborts the
/// task. The task also exits by itself once the receiving side is gone.
pub struct RefreshScheduler {
    task: JoinHandle<()>,
    trigger: Arc<Notify>,
}

impl RefreshScheduler {
    pub fn start<S: FeedSource>(
        source: Arc<S>,
        interval: Duration,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let trigger = Arc::new(Notify::new());
        let task = tokio::spawn(run_cycles(source, interval, tx, trigger.clone()));

        tracing::info!(interval_secs = interval.as_secs(), "refresh scheduler started");
        Self { task, trigger }
    }

    /// Queue an extra cycle without waiting for the next tick. A request made
    /// while a cycle is in flight runs right after it.
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        // Drop does the abort.
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            tracing::info!("refresh scheduler stopped");
        }
        self.task.abort();
    }
}

async fn run_cycles<S: FeedSource>(
    source: Arc<S>,
    interval: Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
    trigger: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = trigger.notified() => {
                tracing::debug!("manual refresh requested");
            }
        }

        if tx.send(AppEvent::RefreshStarted).is_err() {
            break;
        }

        let state = source.refresh().await;

        if tx.send(AppEvent::RefreshFinished(state)).is_err() {
            break;
        }
    }

    tracing::debug!("refresh loop exited");
}
