//! A single navigable directory pane.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::error::ViewError;
use crate::entry::ContentEntry;
use crate::history::NavigationHistory;
use crate::listing::{DirectoryLister, Listing};
use crate::notifications::{ViewBroadcaster, ViewEvent};
use crate::types::{ColumnProperty, ColumnWidths, ViewId};
use crate::watcher::{
    ChangeKind, PathWatcher, ReloadScheduler, Reloadable, ViewRegistry, WatchBackend,
};

/// How a navigation affects the history stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryUpdate {
    /// User navigation: departing path goes on `back`, `forward` is cleared.
    Record,
    /// Leave both stacks alone.
    Skip,
    /// Going back: departing path goes on `forward`.
    Back,
    /// Going forward: departing path goes on `back`, `forward` is kept.
    Forward,
}

/// What a view persists between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewLayout {
    pub directory: Option<PathBuf>,
    pub column_widths: ColumnWidths,
}

struct ViewState {
    current: Option<PathBuf>,
    history: NavigationHistory,
    entries: Vec<ContentEntry>,
    column_widths: ColumnWidths,
}

/// One directory pane: current directory, its listing, history and watcher.
///
/// Created through [`ViewHub::open_view`](super::ViewHub::open_view). Every
/// operation runs under the view's state lock, so a silent refresh from the
/// drain cycle and a user navigation never interleave.
pub struct DirectoryView {
    id: ViewId,
    registry: Arc<ViewRegistry>,
    scheduler: Arc<ReloadScheduler>,
    lister: Arc<dyn DirectoryLister>,
    broadcaster: ViewBroadcaster,
    watcher: Mutex<PathWatcher>,
    state: Mutex<ViewState>,
    closed: AtomicBool,
}

impl DirectoryView {
    pub(crate) fn new(
        id: ViewId,
        registry: Arc<ViewRegistry>,
        scheduler: Arc<ReloadScheduler>,
        lister: Arc<dyn DirectoryLister>,
        backend: Box<dyn WatchBackend>,
        broadcaster: ViewBroadcaster,
        history_depth: usize,
    ) -> Arc<Self> {
        let sink_scheduler = Arc::clone(&scheduler);
        let watcher = PathWatcher::new(
            backend,
            Arc::new(move |path: &Path, kind: ChangeKind| {
                crate::debug_event!("watcher", "change", "{kind:?} in {}", path.display());
                sink_scheduler.notify_changed(path);
            }),
        );

        let view = Arc::new(Self {
            id,
            registry: Arc::clone(&registry),
            scheduler,
            lister,
            broadcaster,
            watcher: Mutex::new(watcher),
            state: Mutex::new(ViewState {
                current: None,
                history: NavigationHistory::new(history_depth),
                entries: Vec::new(),
                column_widths: ColumnWidths::default(),
            }),
            closed: AtomicBool::new(false),
        });

        let handle: Weak<DirectoryView> = Arc::downgrade(&view);
        registry.attach(id, handle);
        view
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Directory currently shown, `None` while unbound.
    pub fn current_directory(&self) -> Option<PathBuf> {
        self.state.lock().current.clone()
    }

    /// Snapshot of the displayed rows: folders first, then files.
    pub fn entries(&self) -> Vec<ContentEntry> {
        self.state.lock().entries.clone()
    }

    pub fn column_widths(&self) -> ColumnWidths {
        self.state.lock().column_widths.clone()
    }

    pub fn can_go_back(&self) -> bool {
        self.state.lock().history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.state.lock().history.can_go_forward()
    }

    /// Back stack, most recent first.
    pub fn back_entries(&self) -> Vec<PathBuf> {
        self.state.lock().history.back_entries()
    }

    /// Forward stack in the order `forward` would visit it.
    pub fn forward_entries(&self) -> Vec<PathBuf> {
        self.state.lock().history.forward_entries()
    }

    /// Directory being watched for live refresh, if the watch is up.
    pub fn watched_directory(&self) -> Option<PathBuf> {
        self.watcher.lock().target().map(Path::to_path_buf)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Show `path`.
    ///
    /// Fails with [`ViewError::PathNotFound`] when `path` is not an existing
    /// directory; the view is then left exactly as it was, so the caller can
    /// restore whatever input produced the path.
    pub fn load_directory(
        &self,
        path: impl AsRef<Path>,
        store_history: bool,
    ) -> Result<(), ViewError> {
        let update = if store_history {
            HistoryUpdate::Record
        } else {
            HistoryUpdate::Skip
        };
        self.navigate(path.as_ref(), update)
    }

    /// Return to the previous directory. `Ok(false)` when there is none.
    pub fn back(&self) -> Result<bool, ViewError> {
        let Some(previous) = self.state.lock().history.pop_back() else {
            return Ok(false);
        };

        match self.navigate(&previous, HistoryUpdate::Back) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.state.lock().history.push_back(&previous);
                Err(e)
            }
        }
    }

    /// Redo a `back`. `Ok(false)` when there is nothing to redo.
    pub fn forward(&self) -> Result<bool, ViewError> {
        let Some(next) = self.state.lock().history.pop_forward() else {
            return Ok(false);
        };

        match self.navigate(&next, HistoryUpdate::Forward) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.state.lock().history.push_forward(&next);
                Err(e)
            }
        }
    }

    /// Go to the parent directory. `Ok(false)` at a filesystem root.
    pub fn up(&self) -> Result<bool, ViewError> {
        let Some(parent) = self
            .current_directory()
            .and_then(|current| current.parent().map(Path::to_path_buf))
        else {
            return Ok(false);
        };

        self.navigate(&parent, HistoryUpdate::Record)?;
        Ok(true)
    }

    /// Open a listed folder by name, as a double-click on its row would.
    pub fn open_entry(&self, name: &str) -> Result<(), ViewError> {
        let entry = self
            .state
            .lock()
            .entries
            .iter()
            .find(|entry| entry.name() == name)
            .cloned()
            .ok_or_else(|| ViewError::EntryNotFound {
                name: name.to_string(),
            })?;

        if !entry.is_folder() {
            return Err(ViewError::NotAFolder {
                name: name.to_string(),
            });
        }

        self.navigate(&entry.path, HistoryUpdate::Record)
    }

    /// Re-list the current directory without touching history.
    ///
    /// This is what the drain cycle runs. Children that cannot be read are
    /// left out of the listing.
    pub fn refresh(&self) -> Result<(), ViewError> {
        if self.is_closed() {
            return Ok(());
        }

        let mut state = self.state.lock();
        let Some(path) = state.current.clone() else {
            return Err(ViewError::Unbound);
        };

        let listing = match self.read_directory(&path) {
            Ok(listing) => listing,
            Err(e) => {
                drop(state);
                self.broadcaster.send(ViewEvent::RefreshFailed {
                    view: self.id,
                    path,
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        if self.is_closed() {
            return Ok(());
        }
        self.attach_to(&path, false);
        let entries = Self::install(&mut state, &listing);
        drop(state);

        crate::debug_event!("view", "refreshed", "{} {} ({entries} entries)", self.id, path.display());
        self.broadcaster.send(ViewEvent::Refreshed {
            view: self.id,
            path,
            entries,
        });
        Ok(())
    }

    pub fn set_column_width(&self, property: ColumnProperty, width: f64) {
        let mut state = self.state.lock();
        state.column_widths.set(property, width);
        Self::reapply_widths(&mut state);
    }

    pub fn set_column_widths(
        &self,
        properties: &[ColumnProperty],
        widths: &[f64],
    ) -> Result<(), ViewError> {
        if properties.len() != widths.len() {
            return Err(ViewError::ColumnMismatch {
                properties: properties.len(),
                widths: widths.len(),
            });
        }

        let mut state = self.state.lock();
        for (property, width) in properties.iter().zip(widths) {
            state.column_widths.set(*property, *width);
        }
        Self::reapply_widths(&mut state);
        Ok(())
    }

    /// Replace all column widths at once.
    pub fn apply_column_widths(&self, widths: &ColumnWidths) {
        let mut state = self.state.lock();
        state.column_widths = widths.clone();
        Self::reapply_widths(&mut state);
    }

    /// Directory and column widths, for the layout to be saved.
    pub fn current_configuration(&self) -> ViewLayout {
        let state = self.state.lock();
        ViewLayout {
            directory: state.current.clone(),
            column_widths: state.column_widths.clone(),
        }
    }

    /// Dispose of the view: stop watching and leave the registry.
    ///
    /// Reloads still queued for it are skipped by the drain cycle.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Waits out any navigation or refresh already past its closed check.
        let state = self.state.lock();
        self.registry.untrack(self.id);
        self.watcher.lock().unwatch();
        drop(state);
        crate::debug_event!("view", "closed", "{}", self.id);
        self.broadcaster.send(ViewEvent::Closed { view: self.id });
    }

    fn navigate(&self, requested: &Path, update: HistoryUpdate) -> Result<(), ViewError> {
        if self.is_closed() {
            return Err(ViewError::Closed);
        }

        let target = normalize(requested);

        let mut state = self.state.lock();
        // Read before touching anything so a failure leaves the view as it was.
        let listing = self.read_directory(&target)?;
        if self.is_closed() {
            return Err(ViewError::Closed);
        }
        let first_load = state.current.is_none();

        if let Some(previous) = state.current.clone() {
            match update {
                HistoryUpdate::Record => state.history.record(&previous),
                HistoryUpdate::Back => state.history.push_forward(&previous),
                HistoryUpdate::Forward => state.history.push_back(&previous),
                HistoryUpdate::Skip => {}
            }
        }

        self.attach_to(&target, true);
        state.current = Some(target.clone());
        let entries = Self::install(&mut state, &listing);
        drop(state);

        crate::log_event!("view", "loaded", "{} {} ({entries} entries)", self.id, target.display());
        self.broadcaster.send(ViewEvent::Loaded {
            view: self.id,
            path: target,
            entries,
        });

        if first_load {
            self.scheduler.ensure_running();
        }
        Ok(())
    }

    fn read_directory(&self, path: &Path) -> Result<Listing, ViewError> {
        if !path.is_dir() {
            crate::debug_event!("view", "not a directory", "{}", path.display());
            return Err(ViewError::PathNotFound {
                path: path.to_path_buf(),
            });
        }

        let listing = self.lister.list(path)?;
        if listing.skipped > 0 {
            crate::debug_event!(
                "view",
                "partial listing",
                "{} unreadable entries in {}",
                listing.skipped,
                path.display()
            );
        }
        Ok(listing)
    }

    /// Track `path` in the registry and make sure the watcher follows it.
    ///
    /// `rewatch` re-establishes the watch even when the target is unchanged,
    /// since the directory may have been deleted and recreated under it.
    fn attach_to(&self, path: &Path, rewatch: bool) {
        self.registry.track(self.id, path);

        let mut watcher = self.watcher.lock();
        if !rewatch && watcher.target() == Some(path) {
            return;
        }
        if let Err(e) = watcher.retarget(path) {
            // The view stays usable; the next navigation retries the watch.
            tracing::warn!(
                "[view] live refresh unavailable for {} ({} backend): {e}",
                self.id,
                watcher.backend_name()
            );
        }
    }

    fn install(state: &mut ViewState, listing: &Listing) -> usize {
        let widths = &state.column_widths;
        let rows: Vec<ContentEntry> = listing
            .items()
            .map(|item| ContentEntry::materialize(item, widths))
            .collect();
        state.entries = rows;
        state.entries.len()
    }

    fn reapply_widths(state: &mut ViewState) {
        let widths = state.column_widths.clone();
        for entry in &mut state.entries {
            entry.apply_column_widths(&widths);
        }
    }
}

impl Reloadable for DirectoryView {
    fn view_id(&self) -> ViewId {
        self.id
    }

    fn reload(&self) -> Result<(), ViewError> {
        self.refresh()
    }
}

impl Drop for DirectoryView {
    fn drop(&mut self) {
        self.registry.untrack(self.id);
    }
}

/// Absolute form of `path` with `.`, `..` and trailing separators resolved
/// lexically. Symlinks are not followed.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` at the root stays at the root.
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
