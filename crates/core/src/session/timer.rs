use crate::session::state::TimerAction;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    key: u64,
    pub generation: u64,
    pub action: TimerAction,
}

/// Delayed session transitions, owned by one session.
///
/// Each timer is a tokio task that posts back through a channel once its delay elapses. All
/// pending tasks are aborted on [`TimerQueue::cancel_all`] and when the queue is dropped.
#[derive(Debug)]
pub struct TimerQueue {
    tx: mpsc::UnboundedSender<TimerFired>,
    rx: mpsc::UnboundedReceiver<TimerFired>,
    pending: HashMap<u64, JoinHandle<()>>,
    next_key: u64,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            pending: HashMap::new(),
            next_key: 0,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, delay: Duration, generation: u64, action: TimerAction) {
        let key = self.next_key;
        self.next_key += 1;

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TimerFired {
                key,
                generation,
                action,
            });
        });
        self.pending.insert(key, handle);
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(pending = self.pending.len(), "cancelling session timers");
        }
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
        // Drop anything that fired but was not consumed yet.
        while self.rx.try_recv().is_ok() {}
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Waits for the next timer to fire. Returns `None` when nothing is scheduled.
    pub async fn next(&mut self) -> Option<TimerFired> {
        while !self.pending.is_empty() {
            let fired = self.rx.recv().await?;
            if self.pending.remove(&fired.key).is_some() {
                return Some(fired);
            }
        }
        None
    }

    #[cfg(test)]
    fn abort_handles(&self) -> Vec<tokio::task::AbortHandle> {
        self.pending.values().map(JoinHandle::abort_handle).collect()
    }
}

impl Drop for TimerQueue {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_in_delay_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(Duration::from_millis(1500), 1, TimerAction::ReleaseSubmit);
        timers.schedule(
            Duration::from_millis(500),
            1,
            TimerAction::Advance { exhausted: false },
        );
        assert_eq!(timers.pending(), 2);

        let first = timers.next().await.unwrap();
        assert_eq!(first.action, TimerAction::Advance { exhausted: false });
        let second = timers.next().await.unwrap();
        assert_eq!(second.action, TimerAction::ReleaseSubmit);
        assert!(timers.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timers_never_deliver() {
        let mut timers = TimerQueue::new();
        timers.schedule(Duration::from_millis(1500), 1, TimerAction::ReleaseSubmit);
        timers.cancel_all();
        assert_eq!(timers.pending(), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(timers.next().await.is_none());
        assert!(timers.rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_queue_aborts_pending_tasks() {
        let mut timers = TimerQueue::new();
        timers.schedule(Duration::from_secs(60), 1, TimerAction::ReleaseSubmit);
        let handles = timers.abort_handles();
        drop(timers);

        // Time is paused and never advanced here, so only an abort can finish the task.
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(handles.iter().all(tokio::task::AbortHandle::is_finished));
    }
}
