//! Live-refresh plumbing shared by every directory view.
//!
//! # Architecture
//!
//! ```text
//! PathWatcher (one per view, notify backend)
//!         |  on_change(path, kind)
//!         v
//! ReloadScheduler::notify_changed
//!   - ViewRegistry::views_watching(path)
//!   - deduplicating FIFO of view ids
//!         |
//!   drain cycle (single shared timer)
//!         v
//! Reloadable::reload  (DirectoryView silent refresh)
//! ```

mod error;
mod path_watcher;
mod registry;
mod scheduler;

pub use error::WatchError;
pub use path_watcher::{
    BackendFactory, ChangeCallback, ChangeKind, NotifyBackend, NullBackend, PathWatcher,
    WatchBackend,
};
pub use registry::ViewRegistry;
pub use scheduler::{DEFAULT_REFRESH_INTERVAL, DrainReport, ReloadScheduler, Reloadable};
