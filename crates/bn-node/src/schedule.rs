use std::time::Duration;

use chrono::Utc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// Seconds before `next_ping_time` the one-shot wake fires, leaving time
/// to poll and answer within the window.
pub const WAKE_LEAD_SECS: i64 = 120;

/// A forced periodic check earlier than this many seconds before the
/// ping time performs no remote call.
pub const WINDOW_EARLY_SECS: i64 = 300;

/// A forced periodic check later than this many seconds after the ping
/// time performs no remote call.
pub const WINDOW_LATE_SECS: i64 = 180;

/// When the one-shot wake should fire for a ping expected at
/// `next_ping_time` (both Unix seconds).
pub fn wake_at(next_ping_time: i64) -> i64 {
    next_ping_time - WAKE_LEAD_SECS
}

/// Whether `now` falls inside the remote-call window around
/// `next_ping_time`.  Bounds are inclusive on both ends.
pub fn in_ping_window(now: i64, next_ping_time: i64) -> bool {
    now >= next_ping_time - WINDOW_EARLY_SECS && now <= next_ping_time + WINDOW_LATE_SECS
}

/// Owns the pending one-shot wake-up task for a node.
///
/// The pending handle is an explicit field, not ambient state;
/// re-scheduling is always "cancel-if-present, then schedule", so at most
/// one wake is outstanding.
#[derive(Debug, Default)]
pub struct WakeScheduler {
    pending: Option<JoinHandle<()>>,
}

impl WakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a one-shot wake at `wake_unix` (Unix seconds), replacing
    /// any pending wake.  A time already in the past fires immediately.
    ///
    /// The wake is delivered as a message on `tx`, feeding the service
    /// loop rather than running work inside the timer task.
    pub fn schedule(&mut self, wake_unix: i64, tx: &mpsc::UnboundedSender<()>) {
        self.cancel();

        let delay = (wake_unix - Utc::now().timestamp()).max(0) as u64;
        debug!(wake_unix, delay_secs = delay, "scheduling one-shot wake");

        let tx = tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay)).await;
            let _ = tx.send(());
        }));
    }

    /// Cancel the pending wake, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a wake is outstanding.
    pub fn is_scheduled(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for WakeScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;

    #[test]
    fn wake_fires_two_minutes_before_the_ping() {
        let next_ping = 1_700_014_400;
        assert_eq!(wake_at(next_ping), 1_700_014_280);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let t = 10_000;
        assert!(in_ping_window(t - WINDOW_EARLY_SECS, t));
        assert!(!in_ping_window(t - WINDOW_EARLY_SECS - 1, t));
        assert!(in_ping_window(t + WINDOW_LATE_SECS, t));
        assert!(!in_ping_window(t + WINDOW_LATE_SECS + 1, t));
        assert!(in_ping_window(t, t));
    }

    #[tokio::test]
    async fn past_wake_time_fires_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = WakeScheduler::new();

        scheduler.schedule(Utc::now().timestamp() - 10, &tx);

        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("wake should fire")
            .expect("sender should still be alive");
    }

    #[tokio::test]
    async fn cancel_prevents_the_wake() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = WakeScheduler::new();

        scheduler.schedule(Utc::now().timestamp() - 10, &tx);
        scheduler.cancel();
        assert!(!scheduler.is_scheduled());

        // The aborted task must not deliver.
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn rescheduling_replaces_the_pending_wake() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = WakeScheduler::new();

        // A far-future wake, then an immediate replacement.
        scheduler.schedule(Utc::now().timestamp() + 3_600, &tx);
        scheduler.schedule(Utc::now().timestamp() - 1, &tx);

        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("replacement wake should fire")
            .unwrap();

        // Exactly one wake was outstanding: nothing else arrives.
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }
}
