pub mod cli;
pub mod config;
pub mod entry;
pub mod history;
pub mod listing;
pub mod logging;
pub mod notifications;
pub mod types;
pub mod view;
pub mod watcher;

pub use config::{Settings, ViewConfig};
pub use entry::{ContentEntry, ContentKind};
pub use history::NavigationHistory;
pub use listing::{DirectoryLister, FsLister, ListError, Listing};
pub use notifications::{ViewBroadcaster, ViewEvent};
pub use types::{ColumnProperty, ColumnWidths, ViewId};
pub use view::{DirectoryView, ViewError, ViewHub, ViewHubBuilder, ViewLayout};
pub use watcher::{ReloadScheduler, ViewRegistry, WatchError};
