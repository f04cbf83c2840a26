// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Debounced task scheduling

use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs a callback once a quiet period has passed since the last `schedule`.
///
/// Scheduling again before the delay elapses aborts the pending callback, so
/// a burst of calls runs only the last one. Must be used inside a Tokio
/// runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        }));
    }

    /// Drop the pending callback, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_only_last_callback() {
        let (tx, rx) = async_channel::unbounded();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        for text in ["a", "an", "ann"] {
            let tx = tx.clone();
            debouncer.schedule(move || {
                let _ = tx.try_send(text);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());

        assert_eq!(rx.recv().await.unwrap(), "ann");
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_each_run() {
        let (tx, rx) = async_channel::unbounded();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        for n in 0..3 {
            let tx = tx.clone();
            debouncer.schedule(move || {
                let _ = tx.try_send(n);
            });
            tokio::time::sleep(Duration::from_millis(80)).await;
        }

        assert_eq!(rx.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_stop_pending_callback() {
        let (tx, rx) = async_channel::unbounded::<()>();

        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let sender = tx.clone();
        debouncer.schedule(move || {
            let _ = sender.try_send(());
        });
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        let sender = tx.clone();
        debouncer.schedule(move || {
            let _ = sender.try_send(());
        });
        drop(debouncer);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
