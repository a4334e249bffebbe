//! List command: one-shot listing through a view.

use std::path::Path;

use anyhow::Context;

use crate::config::Settings;
use crate::entry::ContentEntry;
use crate::types::ColumnProperty;
use crate::view::ViewHub;

/// Render entries as aligned rows in column order.
pub fn format_rows(entries: &[ContentEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{:<40} {:<20} {:<12} {:>10}",
                entry.property(ColumnProperty::Name),
                entry.property(ColumnProperty::DateModified),
                entry.property(ColumnProperty::Type),
                entry.property(ColumnProperty::Size),
            )
        })
        .collect()
}

pub fn run_list(settings: &Settings, directory: &Path) -> anyhow::Result<()> {
    let hub = ViewHub::builder()
        .history_depth(settings.history.max_depth)
        .without_live_refresh()
        .build();
    let view = hub.open_view();
    view.load_directory(directory, false)
        .with_context(|| format!("cannot list {}", directory.display()))?;

    let entries = view.entries();
    let header = format!(
        "{:<40} {:<20} {:<12} {:>10}",
        "Name", "Date modified", "Type", "Size"
    );
    println!("{header}");
    println!("{}", "-".repeat(header.len()));
    for row in format_rows(&entries) {
        println!("{row}");
    }
    println!("\n{} items", entries.len());

    view.close();
    Ok(())
}
