//! Directory views and the hub they are opened from.

mod directory_view;
mod error;
mod hub;

pub use directory_view::{DirectoryView, ViewLayout};
pub use error::ViewError;
pub use hub::{ViewHub, ViewHubBuilder};
