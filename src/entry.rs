//! Display rows for listed directory items.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::listing::{ItemInfo, ItemKind};
use crate::types::{ColumnProperty, ColumnWidths};

const SIZE_UNITS: [&str; 6] = ["bytes", "KB", "MB", "GB", "TB", "PB"];

/// Type label shown for folders.
pub const FOLDER_TYPE_LABEL: &str = "File folder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    File,
    Folder,
}

/// A renderable row: one display string per property column plus the
/// column widths it should be laid out with.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub path: PathBuf,
    pub kind: ContentKind,
    properties: [String; 4],
    column_widths: ColumnWidths,
}

impl ContentEntry {
    /// Build a row for `item`, copying `widths` into it.
    pub fn materialize(item: &ItemInfo, widths: &ColumnWidths) -> Self {
        let modified = item.modified.as_ref().map(format_modified).unwrap_or_default();

        let (kind, type_label, size) = match &item.kind {
            ItemKind::Folder => (ContentKind::Folder, FOLDER_TYPE_LABEL.to_string(), String::new()),
            ItemKind::File { len, extension } => {
                (ContentKind::File, extension.clone(), format_size(*len))
            }
        };

        Self {
            path: item.path.clone(),
            kind,
            properties: [item.name.clone(), modified, type_label, size],
            column_widths: widths.clone(),
        }
    }

    pub fn name(&self) -> &str {
        self.property(ColumnProperty::Name)
    }

    pub fn property(&self, property: ColumnProperty) -> &str {
        &self.properties[property.index()]
    }

    pub fn column_widths(&self) -> &ColumnWidths {
        &self.column_widths
    }

    pub fn apply_column_widths(&mut self, widths: &ColumnWidths) {
        self.column_widths = widths.clone();
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ContentKind::Folder
    }
}

/// Human-readable size: whole units of 1024, e.g. `1536` → `1 KB`.
pub fn format_size(len: u64) -> String {
    let mut size = len;
    let mut level = 0;

    while size >= 1024 && level < SIZE_UNITS.len() - 1 {
        size /= 1024;
        level += 1;
    }

    format!("{size} {}", SIZE_UNITS[level])
}

pub fn format_modified(time: &DateTime<Local>) -> String {
    time.format("%m/%d/%Y %I:%M %p").to_string()
}
