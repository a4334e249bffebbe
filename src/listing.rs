//! Directory enumeration.
//!
//! A [`DirectoryLister`] turns a directory path into a [`Listing`]: folders
//! first, then files, each in the order the OS enumerates them. Children that
//! cannot be read are skipped rather than failing the whole listing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

/// Errors from listing a directory.
#[derive(Error, Debug)]
pub enum ListError {
    #[error("Directory not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Cannot read directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ListError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ListError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::NotADirectory => ListError::NotADirectory {
                path: path.to_path_buf(),
            },
            _ => ListError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// What kind of item a descriptor describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    File {
        len: u64,
        /// Extension including the leading dot, empty when there is none.
        extension: String,
    },
}

/// One child of a listed directory.
#[derive(Debug, Clone)]
pub struct ItemInfo {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<DateTime<Local>>,
    pub kind: ItemKind,
}

impl ItemInfo {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder)
    }
}

/// Result of enumerating one directory.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub folders: Vec<ItemInfo>,
    pub files: Vec<ItemInfo>,
    /// Children that were enumerated but could not be stat'ed.
    pub skipped: usize,
}

impl Listing {
    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Folders followed by files.
    pub fn items(&self) -> impl Iterator<Item = &ItemInfo> {
        self.folders.iter().chain(self.files.iter())
    }
}

/// Filesystem enumeration used by directory views.
pub trait DirectoryLister: Send + Sync {
    fn list(&self, path: &Path) -> Result<Listing, ListError>;
}

/// Lists directories from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

impl FsLister {
    fn describe(entry: &fs::DirEntry) -> io::Result<ItemInfo> {
        let path = entry.path();
        // Follows symlinks so a link to a folder lists as a folder.
        let metadata = fs::metadata(&path)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let modified = metadata.modified().ok().map(DateTime::<Local>::from);

        let kind = if metadata.is_dir() {
            ItemKind::Folder
        } else {
            ItemKind::File {
                len: metadata.len(),
                extension: path
                    .extension()
                    .map(|ext| format!(".{}", ext.to_string_lossy()))
                    .unwrap_or_default(),
            }
        };

        Ok(ItemInfo {
            name,
            path,
            modified,
            kind,
        })
    }
}

impl DirectoryLister for FsLister {
    fn list(&self, path: &Path) -> Result<Listing, ListError> {
        let reader = fs::read_dir(path).map_err(|e| ListError::from_io(path, e))?;
        let mut listing = Listing::default();

        for entry in reader {
            let described = entry.and_then(|entry| Self::describe(&entry));
            match described {
                Ok(item) if item.is_folder() => listing.folders.push(item),
                Ok(item) => listing.files.push(item),
                Err(e) => {
                    listing.skipped += 1;
                    crate::debug_event!("listing", "skipped child", "{}: {e}", path.display());
                }
            }
        }

        Ok(listing)
    }
}
