//! The shared service object that owns the registry and scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;

use super::directory_view::DirectoryView;
use crate::config::{Settings, ViewConfig};
use crate::history::DEFAULT_MAX_DEPTH;
use crate::listing::{DirectoryLister, FsLister};
use crate::notifications::{ViewBroadcaster, ViewEvent};
use crate::types::ViewId;
use crate::watcher::{
    BackendFactory, DEFAULT_REFRESH_INTERVAL, NotifyBackend, NullBackend, ReloadScheduler,
    ViewRegistry, WatchBackend,
};

/// Owns everything views share: one registry, one reload scheduler, one
/// event channel.
///
/// Construct one per process (or per test) and open views from it. Dropping
/// the hub stops the drain cycle.
pub struct ViewHub {
    registry: Arc<ViewRegistry>,
    scheduler: Arc<ReloadScheduler>,
    lister: Arc<dyn DirectoryLister>,
    backend_factory: BackendFactory,
    broadcaster: ViewBroadcaster,
    history_depth: usize,
    next_id: AtomicU32,
}

impl ViewHub {
    /// Create a builder for configuring the hub.
    pub fn builder() -> ViewHubBuilder {
        ViewHubBuilder::new()
    }

    /// Hub configured from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::builder()
            .refresh_interval(Duration::from_millis(settings.refresh.interval_ms))
            .history_depth(settings.history.max_depth)
            .build()
    }

    /// Open a new, unbound view.
    pub fn open_view(&self) -> Arc<DirectoryView> {
        let id = self.allocate_id();
        crate::debug_event!("hub", "open", "{id}");
        DirectoryView::new(
            id,
            Arc::clone(&self.registry),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.lister),
            (self.backend_factory)(),
            self.broadcaster.clone(),
            self.history_depth,
        )
    }

    /// Open a view from a saved layout entry.
    ///
    /// If the saved directory no longer exists the view is returned unbound.
    pub fn open_view_from(&self, config: &ViewConfig) -> Arc<DirectoryView> {
        let view = self.open_view();
        view.apply_column_widths(&config.column_widths);

        if let Err(e) = view.load_directory(&config.directory, false) {
            tracing::warn!(
                "[hub] {} could not restore {}: {e}",
                view.id(),
                config.directory.display()
            );
        }
        view
    }

    pub fn registry(&self) -> &Arc<ViewRegistry> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Arc<ReloadScheduler> {
        &self.scheduler
    }

    pub fn broadcaster(&self) -> &ViewBroadcaster {
        &self.broadcaster
    }

    /// Subscribe to events from every view of this hub.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.broadcaster.subscribe()
    }

    /// Stop the drain cycle. Views stay usable but no longer live-refresh.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn allocate_id(&self) -> ViewId {
        loop {
            // Zero is skipped if the counter ever wraps.
            if let Some(id) = ViewId::new(self.next_id.fetch_add(1, Ordering::Relaxed)) {
                return id;
            }
        }
    }
}

impl Drop for ViewHub {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}

/// Builder for constructing a ViewHub.
pub struct ViewHubBuilder {
    refresh_interval: Duration,
    history_depth: usize,
    lister: Option<Arc<dyn DirectoryLister>>,
    backend_factory: Option<BackendFactory>,
    event_capacity: usize,
}

impl ViewHubBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            history_depth: DEFAULT_MAX_DEPTH,
            lister: None,
            backend_factory: None,
            event_capacity: 256,
        }
    }

    /// Set the drain cycle interval.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the back-stack bound for every view.
    pub fn history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Use a custom directory lister.
    pub fn lister(mut self, lister: Arc<dyn DirectoryLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    /// Use a custom watch backend, one instance per view.
    pub fn watch_backend<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn WatchBackend> + Send + Sync + 'static,
    {
        self.backend_factory = Some(Arc::new(factory));
        self
    }

    /// Views never receive change notifications.
    pub fn without_live_refresh(self) -> Self {
        self.watch_backend(|| -> Box<dyn WatchBackend> { Box::new(NullBackend) })
    }

    /// Set the event channel capacity.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Build the ViewHub.
    pub fn build(self) -> ViewHub {
        let registry = Arc::new(ViewRegistry::new());
        let scheduler = Arc::new(ReloadScheduler::new(
            Arc::clone(&registry),
            self.refresh_interval,
        ));

        ViewHub {
            registry,
            scheduler,
            lister: self.lister.unwrap_or_else(|| Arc::new(FsLister)),
            backend_factory: self
                .backend_factory
                .unwrap_or_else(|| {
                    Arc::new(|| -> Box<dyn WatchBackend> { Box::new(NotifyBackend::new()) })
                }),
            broadcaster: ViewBroadcaster::new(self.event_capacity),
            history_depth: self.history_depth,
            next_id: AtomicU32::new(1),
        }
    }
}

impl Default for ViewHubBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnProperty, ColumnWidths};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_views_get_distinct_ids() {
        let hub = ViewHub::builder().without_live_refresh().build();
        let a = hub.open_view();
        let b = hub.open_view();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.refresh.interval_ms = 125;
        settings.history.max_depth = 1;
        let hub = ViewHub::from_settings(&settings);

        assert_eq!(hub.scheduler().interval(), Duration::from_millis(125));
        assert!(!hub.scheduler().is_running());
    }

    #[test]
    fn test_open_view_from_config() {
        let dir = TempDir::new().unwrap();
        let hub = ViewHub::builder().without_live_refresh().build();
        let config = ViewConfig {
            row: 0,
            column: 1,
            directory: dir.path().to_path_buf(),
            column_widths: [(ColumnProperty::Name, 250.0)].into_iter().collect(),
        };

        let view = hub.open_view_from(&config);

        assert_eq!(view.current_directory(), Some(dir.path().to_path_buf()));
        assert_eq!(view.column_widths().get(ColumnProperty::Name), 250.0);
        assert!(!view.can_go_back());
    }

    #[test]
    fn test_open_view_from_missing_directory_is_unbound() {
        let dir = TempDir::new().unwrap();
        let hub = ViewHub::builder().without_live_refresh().build();
        let config = ViewConfig {
            directory: dir.path().join("moved-away"),
            column_widths: ColumnWidths::default(),
            ..ViewConfig::default()
        };

        let view = hub.open_view_from(&config);
        assert_eq!(view.current_directory(), None);
        assert_eq!(hub.registry().view_count(), 0);
    }

    #[test]
    fn test_two_views_one_directory_one_drain() {
        let dir = TempDir::new().unwrap();
        let hub = ViewHub::builder().without_live_refresh().build();
        let mut events = hub.subscribe();
        let v1 = hub.open_view();
        let v2 = hub.open_view();
        v1.load_directory(dir.path(), true).unwrap();
        v2.load_directory(dir.path(), true).unwrap();
        fs::write(dir.path().join("fresh.txt"), b"1").unwrap();

        // Two change events for the same directory before the drain.
        hub.scheduler().notify_changed(dir.path());
        hub.scheduler().notify_changed(dir.path());
        let report = hub.scheduler().drain();

        assert_eq!(report.reloaded, 2);
        assert_eq!(hub.scheduler().pending_count(), 0);

        let mut refreshed: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| match event {
                ViewEvent::Refreshed { view, .. } => Some(view),
                _ => None,
            })
            .collect();
        refreshed.sort();
        let mut expected = vec![v1.id(), v2.id()];
        expected.sort();
        assert_eq!(refreshed, expected);

        for view in [&v1, &v2] {
            assert!(view.entries().iter().any(|e| e.name() == "fresh.txt"));
            assert!(!view.can_go_back());
        }
    }

    #[test]
    fn test_navigation_moves_view_out_of_reload_fanout() {
        let root = TempDir::new().unwrap();
        let first = root.path().join("first");
        let second = root.path().join("second");
        fs::create_dir(&first).unwrap();
        fs::create_dir(&second).unwrap();

        let hub = ViewHub::builder().without_live_refresh().build();
        let view = hub.open_view();
        view.load_directory(&first, true).unwrap();
        view.load_directory(&second, true).unwrap();

        assert_eq!(hub.scheduler().notify_changed(&first), 0);
        assert_eq!(hub.scheduler().notify_changed(&second), 1);
        assert_eq!(
            hub.registry().watched_paths(),
            vec![PathBuf::from(&second)]
        );
    }
}
