//! Coalescing reload queue and the periodic drain cycle.
//!
//! Change notifications only enqueue view ids; the actual re-listing happens
//! later, on a fixed cadence, one view at a time. A burst of events for the
//! same directory therefore costs each affected view a single reload.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::registry::ViewRegistry;
use crate::types::ViewId;
use crate::view::ViewError;

/// Default drain cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Something the scheduler can ask to re-list its directory.
pub trait Reloadable: Send + Sync {
    fn view_id(&self) -> ViewId;

    /// Re-list the current directory without recording navigation history.
    fn reload(&self) -> Result<(), ViewError>;
}

/// FIFO of view ids in which each id appears at most once.
#[derive(Debug, Default)]
struct ReloadQueue {
    order: VecDeque<ViewId>,
    pending: HashSet<ViewId>,
}

impl ReloadQueue {
    fn push(&mut self, view: ViewId) -> bool {
        if self.pending.insert(view) {
            self.order.push_back(view);
            true
        } else {
            false
        }
    }

    fn pop(&mut self) -> Option<ViewId> {
        let view = self.order.pop_front()?;
        self.pending.remove(&view);
        Some(view)
    }
}

/// Outcome of one drain cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub reloaded: usize,
    pub failed: usize,
    /// Popped ids whose view was already closed or dropped.
    pub skipped: usize,
}

impl DrainReport {
    pub fn processed(&self) -> usize {
        self.reloaded + self.failed + self.skipped
    }
}

/// Shared reload queue plus the single timer that drains it.
pub struct ReloadScheduler {
    registry: Arc<ViewRegistry>,
    queue: Mutex<ReloadQueue>,
    interval: Duration,
    running: Mutex<Option<CancellationToken>>,
}

impl ReloadScheduler {
    pub fn new(registry: Arc<ViewRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            queue: Mutex::new(ReloadQueue::default()),
            interval,
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Queue a reload for every view on `path`.
    ///
    /// Called from watcher threads. Only touches the queue; returns how many
    /// views were newly queued.
    pub fn notify_changed(&self, path: &Path) -> usize {
        // Registry lock is released before the queue lock is taken.
        let views = self.registry.views_watching(path);
        if views.is_empty() {
            crate::debug_event!("scheduler", "no views", "{}", path.display());
            return 0;
        }

        let mut queue = self.queue.lock();
        let queued = views.into_iter().filter(|view| queue.push(*view)).count();
        drop(queue);

        crate::debug_event!(
            "scheduler",
            "changed",
            "{} ({queued} newly queued)",
            path.display()
        );
        queued
    }

    /// Queue a single view. Returns `false` if it was already pending.
    pub fn enqueue(&self, view: ViewId) -> bool {
        self.queue.lock().push(view)
    }

    pub fn pending(&self) -> Vec<ViewId> {
        self.queue.lock().order.iter().copied().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().order.len()
    }

    /// Run one drain cycle.
    ///
    /// Reloads every view that was pending when the cycle started, in the
    /// order they were first queued. Views queued while the cycle runs, even
    /// ones already handled in it, wait for the next cycle. A failing view
    /// does not stop the rest.
    pub fn drain(&self) -> DrainReport {
        let budget = self.pending_count();
        let mut report = DrainReport::default();

        for _ in 0..budget {
            // Pop one at a time so notifications can keep arriving.
            let Some(view) = self.queue.lock().pop() else {
                break;
            };

            let Some(target) = self.registry.handle(view) else {
                crate::debug_event!("scheduler", "skipped", "{view} is closed");
                report.skipped += 1;
                continue;
            };

            match target.reload() {
                Ok(()) => report.reloaded += 1,
                Err(e) => {
                    tracing::warn!("[scheduler] reload of {view} failed: {e}");
                    report.failed += 1;
                }
            }
        }

        if report.processed() > 0 {
            crate::debug_event!(
                "scheduler",
                "drained",
                "{} reloaded, {} failed, {} skipped",
                report.reloaded,
                report.failed,
                report.skipped
            );
        }
        report
    }

    /// Start the drain cycle if it is not running yet.
    ///
    /// Needs a Tokio runtime; without one the call is a no-op and `drain`
    /// has to be driven by the caller. Returns whether a cycle is running.
    pub fn ensure_running(self: &Arc<Self>) -> bool {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return true;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            crate::debug_event!("scheduler", "no runtime, drain cycle not started");
            return false;
        };

        let token = CancellationToken::new();
        runtime.spawn(Arc::clone(self).run(token.clone()));
        *running = Some(token);

        crate::log_event!("scheduler", "started", "every {:?}", self.interval);
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Stop the drain cycle. Pending reloads stay queued.
    pub fn shutdown(&self) {
        if let Some(token) = self.running.lock().take() {
            token.cancel();
            crate::debug_event!("scheduler", "stopped");
        }
    }

    async fn run(self: Arc<Self>, token: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if self.pending_count() == 0 {
                        continue;
                    }

                    // Listing blocks on disk I/O; keep it off the async workers.
                    let scheduler = Arc::clone(&self);
                    if let Err(e) = tokio::task::spawn_blocking(move || scheduler.drain()).await {
                        tracing::error!("[scheduler] drain cycle panicked: {e}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Weak;

    /// Records reloads into a shared log and can be told to fail.
    struct FakeView {
        id: ViewId,
        log: Arc<Mutex<Vec<ViewId>>>,
        fail: bool,
        on_reload: Option<Box<dyn Fn() + Send + Sync>>,
    }

    impl Reloadable for FakeView {
        fn view_id(&self) -> ViewId {
            self.id
        }

        fn reload(&self) -> Result<(), ViewError> {
            self.log.lock().push(self.id);
            if let Some(hook) = &self.on_reload {
                hook();
            }
            if self.fail {
                return Err(ViewError::PathNotFound {
                    path: PathBuf::from("/gone"),
                });
            }
            Ok(())
        }
    }

    struct Fixture {
        registry: Arc<ViewRegistry>,
        scheduler: Arc<ReloadScheduler>,
        log: Arc<Mutex<Vec<ViewId>>>,
        views: Vec<Arc<dyn Reloadable>>,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(ViewRegistry::new());
            let scheduler = Arc::new(ReloadScheduler::new(
                Arc::clone(&registry),
                DEFAULT_REFRESH_INTERVAL,
            ));
            Self {
                registry,
                scheduler,
                log: Arc::default(),
                views: Vec::new(),
            }
        }

        fn add(
            &mut self,
            n: u32,
            path: &str,
            fail: bool,
            on_reload: Option<Box<dyn Fn() + Send + Sync>>,
        ) -> ViewId {
            let id = ViewId::new(n).unwrap();
            let view: Arc<dyn Reloadable> = Arc::new(FakeView {
                id,
                log: Arc::clone(&self.log),
                fail,
                on_reload,
            });
            self.registry.attach(id, Arc::downgrade(&view));
            self.registry.track(id, Path::new(path));
            self.views.push(view);
            id
        }
    }

    #[test]
    fn test_repeated_notifications_coalesce() {
        let mut fx = Fixture::new();
        let v = fx.add(1, "/d", false, None);

        assert_eq!(fx.scheduler.notify_changed(Path::new("/d")), 1);
        for _ in 0..10 {
            assert_eq!(fx.scheduler.notify_changed(Path::new("/d")), 0);
        }

        assert_eq!(fx.scheduler.pending(), vec![v]);
    }

    #[test]
    fn test_drain_is_fifo_and_empties_queue() {
        let mut fx = Fixture::new();
        let a = fx.add(1, "/a", false, None);
        let b = fx.add(2, "/b", false, None);
        let c = fx.add(3, "/c", false, None);

        fx.scheduler.notify_changed(Path::new("/b"));
        fx.scheduler.notify_changed(Path::new("/c"));
        fx.scheduler.notify_changed(Path::new("/a"));
        fx.scheduler.notify_changed(Path::new("/b"));

        let report = fx.scheduler.drain();

        assert_eq!(report.reloaded, 3);
        assert_eq!(*fx.log.lock(), vec![b, c, a]);
        assert_eq!(fx.scheduler.pending_count(), 0);
    }

    #[test]
    fn test_two_views_same_path_reload_once_each() {
        let mut fx = Fixture::new();
        let v1 = fx.add(1, "/d", false, None);
        let v2 = fx.add(2, "/d", false, None);

        fx.scheduler.notify_changed(Path::new("/d"));
        fx.scheduler.notify_changed(Path::new("/d"));
        fx.scheduler.drain();

        let mut log = fx.log.lock().clone();
        log.sort();
        assert_eq!(log, vec![v1, v2]);
        assert_eq!(fx.scheduler.pending_count(), 0);
    }

    #[test]
    fn test_requeue_during_drain_waits_for_next_cycle() {
        let mut fx = Fixture::new();
        let scheduler = Arc::clone(&fx.scheduler);
        let weak: Weak<ReloadScheduler> = Arc::downgrade(&scheduler);
        let v = fx.add(
            1,
            "/d",
            false,
            Some(Box::new(move || {
                if let Some(s) = weak.upgrade() {
                    s.notify_changed(Path::new("/d"));
                }
            })),
        );

        fx.scheduler.notify_changed(Path::new("/d"));
        let first = fx.scheduler.drain();

        assert_eq!(first.reloaded, 1);
        assert_eq!(fx.scheduler.pending(), vec![v]);

        let second = fx.scheduler.drain();
        assert_eq!(second.reloaded, 1);
        assert_eq!(*fx.log.lock(), vec![v, v]);
    }

    #[test]
    fn test_failure_is_isolated() {
        let mut fx = Fixture::new();
        let bad = fx.add(1, "/bad", true, None);
        let good = fx.add(2, "/good", false, None);

        fx.scheduler.notify_changed(Path::new("/bad"));
        fx.scheduler.notify_changed(Path::new("/good"));
        let report = fx.scheduler.drain();

        assert_eq!(report.failed, 1);
        assert_eq!(report.reloaded, 1);
        assert_eq!(*fx.log.lock(), vec![bad, good]);
    }

    #[test]
    fn test_untracked_view_is_skipped() {
        let mut fx = Fixture::new();
        let v = fx.add(1, "/d", false, None);

        fx.scheduler.notify_changed(Path::new("/d"));
        fx.registry.untrack(v);
        assert!(!fx.registry.is_attached(v));
        let report = fx.scheduler.drain();

        assert_eq!(report.skipped, 1);
        assert!(fx.log.lock().is_empty());
    }

    #[test]
    fn test_dropped_view_is_skipped() {
        let mut fx = Fixture::new();
        fx.add(1, "/d", false, None);

        fx.scheduler.notify_changed(Path::new("/d"));
        fx.views.clear();
        let report = fx.scheduler.drain();

        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_unwatched_path_queues_nothing() {
        let fx = Fixture::new();
        assert_eq!(fx.scheduler.notify_changed(Path::new("/nobody")), 0);
        assert_eq!(fx.scheduler.drain(), DrainReport::default());
    }

    #[test]
    fn test_enqueue_deduplicates_direct_requests() {
        let fx = Fixture::new();
        let stranger = ViewId::new(42).unwrap();

        assert!(fx.scheduler.enqueue(stranger));
        assert!(!fx.scheduler.enqueue(stranger));
        assert_eq!(fx.scheduler.pending_count(), 1);

        // Never attached, so there is nothing to reload.
        let report = fx.scheduler.drain();
        assert_eq!(report.skipped, 1);
        assert_eq!(fx.scheduler.pending_count(), 0);
    }

    #[test]
    fn test_ensure_running_without_runtime() {
        let fx = Fixture::new();
        assert!(!fx.scheduler.ensure_running());
        assert!(!fx.scheduler.is_running());
    }

    #[tokio::test]
    async fn test_drain_cycle_runs_on_interval() {
        let mut fx = Fixture::new();
        let registry = Arc::clone(&fx.registry);
        fx.scheduler = Arc::new(ReloadScheduler::new(registry, Duration::from_millis(20)));
        let v = fx.add(1, "/d", false, None);

        assert!(fx.scheduler.ensure_running());
        assert!(fx.scheduler.ensure_running());
        fx.scheduler.notify_changed(Path::new("/d"));

        for _ in 0..100 {
            if !fx.log.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(*fx.log.lock(), vec![v]);
        fx.scheduler.shutdown();
        assert!(!fx.scheduler.is_running());
    }
}
