use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-edge debouncer: only the last call inside the idle window runs.
///
/// Dropping the debouncer cancels whatever is still scheduled.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    scheduled: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            scheduled: Mutex::new(None),
        }
    }

    /// Schedules `task` after the idle window, replacing any earlier call.
    pub fn call<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task().await;
        });
        if let Some(previous) = self.slot().replace(handle) {
            previous.abort();
        }
    }

    /// Drops the scheduled call, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|h| !h.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.scheduled.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn recorder() -> Arc<Mutex<Vec<u32>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn push(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> impl FnOnce() -> std::future::Ready<()> {
        let log = Arc::clone(log);
        move || {
            log.lock().unwrap().push(value);
            std::future::ready(())
        }
    }

    async fn settle(duration: Duration) {
        tokio::time::sleep(duration).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_call_fires() {
        let log = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.call(push(&log, 1));
        settle(Duration::from_millis(200)).await;
        debouncer.call(push(&log, 2));
        settle(Duration::from_millis(200)).await;
        debouncer.call(push(&log, 3));

        settle(Duration::from_millis(499)).await;
        assert!(log.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        settle(Duration::from_millis(2)).await;
        assert_eq!(*log.lock().unwrap(), vec![3]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_fire_separately() {
        let log = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.call(push(&log, 1));
        settle(Duration::from_millis(150)).await;
        debouncer.call(push(&log, 2));
        settle(Duration::from_millis(150)).await;
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_call() {
        let log = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.call(push(&log, 1));
        drop(debouncer);

        settle(Duration::from_millis(200)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_pending() {
        let log = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(100));
        assert!(!debouncer.cancel());
        debouncer.call(push(&log, 1));
        assert!(debouncer.cancel());
        settle(Duration::from_millis(200)).await;
        assert!(log.lock().unwrap().is_empty());
    }
}
