//! Single-directory change watching.
//!
//! A [`PathWatcher`] follows exactly one directory at a time. The OS-specific
//! part lives behind [`WatchBackend`] so the rest of the system can be driven
//! with synthetic events.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecursiveMode, Watcher};

use super::error::WatchError;

/// Kind of change reported for a watched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Deleted,
    Renamed,
    Modified,
}

impl ChangeKind {
    /// Map a notify event kind, ignoring pure access events.
    ///
    /// Opening the directory to list it must not look like a change, or every
    /// reload would schedule another one.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Remove(_) => Some(ChangeKind::Deleted),
            EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
            EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Modified),
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(ChangeKind::Modified),
            EventKind::Access(_) | EventKind::Other => None,
        }
    }
}

/// Callback invoked with the watched directory and the kind of change.
pub type ChangeCallback = Arc<dyn Fn(&Path, ChangeKind) + Send + Sync>;

/// OS-level change notification for one directory.
pub trait WatchBackend: Send {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Start delivering changes to direct children of `path`.
    ///
    /// Replaces any previous watch held by this backend.
    fn watch(&mut self, path: &Path, on_change: ChangeCallback) -> Result<(), WatchError>;

    /// Stop delivering changes.
    fn unwatch(&mut self);
}

/// Backend built on `notify::RecommendedWatcher`.
#[derive(Default)]
pub struct NotifyBackend {
    watcher: Option<notify::RecommendedWatcher>,
}

impl NotifyBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchBackend for NotifyBackend {
    fn name(&self) -> &str {
        "notify"
    }

    fn watch(&mut self, path: &Path, on_change: ChangeCallback) -> Result<(), WatchError> {
        self.unwatch();

        let watched = path.to_path_buf();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Some(kind) = ChangeKind::from_event_kind(&event.kind) {
                        on_change(&watched, kind);
                    }
                }
                Err(e) => {
                    tracing::warn!("[watcher] file watch error: {e}");
                }
            }
        })?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::WatchSetupFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.watcher = Some(watcher);
        Ok(())
    }

    fn unwatch(&mut self) {
        // Dropping the watcher stops its event thread.
        self.watcher = None;
    }
}

/// Backend that never reports changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl WatchBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn watch(&mut self, _path: &Path, _on_change: ChangeCallback) -> Result<(), WatchError> {
        Ok(())
    }

    fn unwatch(&mut self) {}
}

/// Factory producing one backend per view.
pub type BackendFactory = Arc<dyn Fn() -> Box<dyn WatchBackend> + Send + Sync>;

/// Watches one directory and forwards its changes to a sink.
///
/// Every retarget bumps a generation counter before the old watch is torn
/// down, and callbacks from older generations are dropped. A late event from
/// the previous directory therefore never reaches the sink.
pub struct PathWatcher {
    backend: Box<dyn WatchBackend>,
    sink: ChangeCallback,
    target: Option<PathBuf>,
    generation: Arc<AtomicU64>,
}

impl PathWatcher {
    pub fn new(backend: Box<dyn WatchBackend>, sink: ChangeCallback) -> Self {
        Self {
            backend,
            sink,
            target: None,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Directory currently being watched, if the last retarget succeeded.
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Point the watcher at `path`.
    ///
    /// On failure the watcher is left detached; nothing is delivered until the
    /// next successful retarget.
    pub fn retarget(&mut self, path: &Path) -> Result<(), WatchError> {
        let generation = self.detach();

        let gate = Arc::clone(&self.generation);
        let sink = Arc::clone(&self.sink);
        let gated: ChangeCallback = Arc::new(move |watched: &Path, kind: ChangeKind| {
            if gate.load(Ordering::Acquire) == generation {
                sink(watched, kind);
            }
        });

        self.backend.watch(path, gated)?;
        self.target = Some(path.to_path_buf());
        crate::debug_event!("watcher", "watching", "{}", path.display());
        Ok(())
    }

    /// Stop watching altogether.
    pub fn unwatch(&mut self) {
        self.detach();
    }

    fn detach(&mut self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.backend.unwatch();
        self.target = None;
        generation
    }
}

impl Drop for PathWatcher {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RenameMode};
    use parking_lot::Mutex;

    type Registered = Arc<Mutex<Vec<(PathBuf, ChangeCallback)>>>;

    /// Keeps every callback it was handed so tests can fire stale ones.
    struct RecordingBackend {
        registered: Registered,
        fail_on: Option<PathBuf>,
    }

    impl WatchBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        fn watch(&mut self, path: &Path, on_change: ChangeCallback) -> Result<(), WatchError> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(WatchError::WatchSetupFailed {
                    path: path.to_path_buf(),
                    reason: "missing".to_string(),
                });
            }
            self.registered.lock().push((path.to_path_buf(), on_change));
            Ok(())
        }

        fn unwatch(&mut self) {}
    }

    fn watcher_with(
        fail_on: Option<PathBuf>,
    ) -> (PathWatcher, Registered, Arc<Mutex<Vec<PathBuf>>>) {
        let registered: Registered = Arc::default();
        let seen: Arc<Mutex<Vec<PathBuf>>> = Arc::default();
        let seen_sink = Arc::clone(&seen);
        let watcher = PathWatcher::new(
            Box::new(RecordingBackend {
                registered: Arc::clone(&registered),
                fail_on,
            }),
            Arc::new(move |path: &Path, _kind: ChangeKind| {
                seen_sink.lock().push(path.to_path_buf())
            }),
        );
        (watcher, registered, seen)
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            Some(ChangeKind::Renamed)
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Access(AccessKind::Open(AccessMode::Any))),
            None
        );
        assert_eq!(
            ChangeKind::from_event_kind(&EventKind::Access(AccessKind::Close(AccessMode::Write))),
            Some(ChangeKind::Modified)
        );
    }

    #[test]
    fn test_retarget_silences_previous_path() {
        let (mut watcher, registered, seen) = watcher_with(None);

        watcher.retarget(Path::new("/old")).unwrap();
        watcher.retarget(Path::new("/new")).unwrap();
        assert_eq!(watcher.target(), Some(Path::new("/new")));

        let callbacks = registered.lock().clone();
        for (path, callback) in &callbacks {
            callback(path, ChangeKind::Modified);
        }

        assert_eq!(*seen.lock(), vec![PathBuf::from("/new")]);
    }

    #[test]
    fn test_failed_retarget_leaves_watcher_detached() {
        let (mut watcher, registered, seen) = watcher_with(Some(PathBuf::from("/gone")));

        watcher.retarget(Path::new("/home")).unwrap();
        let err = watcher.retarget(Path::new("/gone")).unwrap_err();

        assert!(matches!(err, WatchError::WatchSetupFailed { .. }));
        assert_eq!(watcher.target(), None);

        let callbacks = registered.lock().clone();
        for (path, callback) in &callbacks {
            callback(path, ChangeKind::Created);
        }
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_unwatch_drops_target() {
        let (mut watcher, registered, seen) = watcher_with(None);
        watcher.retarget(Path::new("/a")).unwrap();
        watcher.unwatch();

        assert_eq!(watcher.target(), None);
        let callbacks = registered.lock().clone();
        (callbacks[0].1)(Path::new("/a"), ChangeKind::Deleted);
        assert!(seen.lock().is_empty());
    }
}
