//! Errors surfaced by directory views.

use std::path::PathBuf;
use thiserror::Error;

use crate::listing::ListError;

/// Errors from view navigation and refresh.
///
/// None of these are fatal: a failed navigation leaves the view where it was.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Directory does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error(transparent)]
    Listing(#[from] ListError),

    #[error("View has no directory loaded")]
    Unbound,

    #[error("View is closed")]
    Closed,

    #[error("No entry named '{name}' in the current directory")]
    EntryNotFound { name: String },

    #[error("'{name}' is not a folder")]
    NotAFolder { name: String },

    #[error("Column properties and widths differ in length ({properties} vs {widths})")]
    ColumnMismatch { properties: usize, widths: usize },
}
