//! Registry of which views are showing which directory.
//!
//! One registry is shared by every view of a [`ViewHub`](crate::view::ViewHub).
//! All bookkeeping happens under a single lock so that moving a view between
//! two paths is atomic from the scheduler's point of view.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::Mutex;

use super::scheduler::Reloadable;
use crate::types::ViewId;

#[derive(Default)]
struct RegistryInner {
    /// Directory -> views currently showing it. Never holds an empty set.
    by_path: HashMap<PathBuf, IndexSet<ViewId>>,
    /// View -> its current directory.
    by_view: HashMap<ViewId, PathBuf>,
    /// Reload targets, held weakly so a dropped view simply disappears.
    handles: HashMap<ViewId, Weak<dyn Reloadable>>,
}

impl RegistryInner {
    fn detach_path(&mut self, view: ViewId) -> Option<PathBuf> {
        let previous = self.by_view.remove(&view)?;
        if let Some(views) = self.by_path.get_mut(&previous) {
            views.shift_remove(&view);
            if views.is_empty() {
                self.by_path.remove(&previous);
            }
        }
        Some(previous)
    }
}

/// Process-wide mapping from directory to the views displaying it.
#[derive(Default)]
pub struct ViewRegistry {
    inner: Mutex<RegistryInner>,
}

impl ViewRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the reload target for `view`.
    pub fn attach(&self, view: ViewId, handle: Weak<dyn Reloadable>) {
        self.inner.lock().handles.insert(view, handle);
    }

    /// Move `view` to `path`, returning the directory it was on before.
    pub fn track(&self, view: ViewId, path: &Path) -> Option<PathBuf> {
        let mut inner = self.inner.lock();
        let previous = inner.detach_path(view);

        inner
            .by_path
            .entry(path.to_path_buf())
            .or_default()
            .insert(view);
        inner.by_view.insert(view, path.to_path_buf());

        previous
    }

    /// Remove `view` entirely. Returns whether it was known.
    pub fn untrack(&self, view: ViewId) -> bool {
        let mut inner = self.inner.lock();
        let had_path = inner.detach_path(view).is_some();
        let had_handle = inner.handles.remove(&view).is_some();
        had_path || had_handle
    }

    /// Snapshot of the views currently on `path`.
    pub fn views_watching(&self, path: &Path) -> Vec<ViewId> {
        self.inner
            .lock()
            .by_path
            .get(path)
            .map(|views| views.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Current directory of `view`, if it has one.
    pub fn path_of(&self, view: ViewId) -> Option<PathBuf> {
        self.inner.lock().by_view.get(&view).cloned()
    }

    /// Live reload target for `view`.
    ///
    /// `None` once the view has been untracked or dropped.
    pub fn handle(&self, view: ViewId) -> Option<Arc<dyn Reloadable>> {
        let inner = self.inner.lock();
        inner.handles.get(&view).and_then(Weak::upgrade)
    }

    pub fn is_attached(&self, view: ViewId) -> bool {
        self.inner.lock().handles.contains_key(&view)
    }

    /// Get all directories with at least one view.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.inner.lock().by_path.keys().cloned().collect()
    }

    /// Get count of directories with at least one view.
    pub fn path_count(&self) -> usize {
        self.inner.lock().by_path.len()
    }

    /// Get count of views that are showing a directory.
    pub fn view_count(&self) -> usize {
        self.inner.lock().by_view.len()
    }
}
