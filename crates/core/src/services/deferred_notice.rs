//! Deferred "still unread" notices.
//!
//! Every inserted unread record gets one timer. When it fires the notice
//! future runs; a single shared token cancels every pending timer at once.

use std::future::Future;
use std::time::Duration;

use noteread_common::{AppError, AppResult};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tracing::debug;

/// Schedules delayed notices and cancels them all on shutdown.
#[derive(Clone)]
pub struct DeferredNoticeScheduler {
    delay: Duration,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl DeferredNoticeScheduler {
    /// Create a scheduler that fires notices after `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Delay between scheduling and firing.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Claim a slot for a notice that will be scheduled later.
    ///
    /// Fails with [`AppError::ShuttingDown`] once [`shutdown`](Self::shutdown)
    /// has been called. A slot taken before shutdown can still be scheduled;
    /// its notice is then cancelled like every other pending one.
    pub fn reserve(&self) -> AppResult<NoticeSlot> {
        if self.shutdown.is_cancelled() {
            return Err(AppError::ShuttingDown);
        }

        Ok(NoticeSlot {
            scheduler: self.clone(),
            _token: self.tracker.token(),
        })
    }

    /// Run `notice` after the delay unless shutdown happens first.
    pub fn schedule<F>(&self, notice: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reserve()?.schedule(notice);
        Ok(())
    }

    fn spawn<F>(&self, notice: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let delay = self.delay;

        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    debug!("Deferred notice cancelled before firing");
                }
                () = tokio::time::sleep(delay) => {
                    tokio::select! {
                        biased;
                        () = shutdown.cancelled() => {
                            debug!("Deferred notice cancelled while firing");
                        }
                        () = notice => {}
                    }
                }
            }
        });
    }

    /// Cancel every pending notice and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Number of notices that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every notice task to finish. Only returns after shutdown.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }
}

/// A claimed notice that has not been scheduled yet.
///
/// Keeps [`DeferredNoticeScheduler::wait`] from returning until the slot is
/// scheduled or dropped.
pub struct NoticeSlot {
    scheduler: DeferredNoticeScheduler,
    _token: TaskTrackerToken,
}

impl NoticeSlot {
    /// Start the timer for `notice`.
    pub fn schedule<F>(self, notice: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.scheduler.spawn(notice);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_notice(fired: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let fired = Arc::clone(fired);
        async move {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_fires_after_delay() {
        let scheduler = DeferredNoticeScheduler::new(Duration::from_millis(2000));
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(counting_notice(&fired)).unwrap();
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_all_pending() {
        let scheduler = DeferredNoticeScheduler::new(Duration::from_millis(2000));
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(counting_notice(&fired)).unwrap();
        scheduler.schedule(counting_notice(&fired)).unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        scheduler.shutdown();
        scheduler.wait().await;

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_schedule_after_shutdown_is_rejected() {
        let scheduler = DeferredNoticeScheduler::new(Duration::from_millis(2000));
        scheduler.shutdown();

        let fired = Arc::new(AtomicUsize::new(0));
        let result = scheduler.schedule(counting_notice(&fired));

        assert!(matches!(result, Err(AppError::ShuttingDown)));
        assert!(matches!(scheduler.reserve(), Err(AppError::ShuttingDown)));
        assert!(scheduler.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_reserved_before_shutdown_is_cancelled() {
        let scheduler = DeferredNoticeScheduler::new(Duration::from_millis(2000));
        let fired = Arc::new(AtomicUsize::new(0));

        let slot = scheduler.reserve().unwrap();
        scheduler.shutdown();
        slot.schedule(counting_notice(&fired));
        scheduler.wait().await;

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_slot_releases_tracker() {
        let scheduler = DeferredNoticeScheduler::new(Duration::from_millis(2000));

        let slot = scheduler.reserve().unwrap();
        scheduler.shutdown();
        drop(slot);

        scheduler.wait().await;
        assert_eq!(scheduler.pending(), 0);
    }
}
