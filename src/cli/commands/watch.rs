//! Watch command: keep views open and print their refreshes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;

use crate::config::{Settings, ViewConfig};
use crate::notifications::ViewEvent;
use crate::view::{DirectoryView, ViewHub};

/// Which views the command opens.
///
/// Explicit directories win; otherwise the saved views, otherwise one view
/// on the default directory.
pub fn view_configs(settings: &Settings, directories: &[PathBuf]) -> Vec<ViewConfig> {
    if !directories.is_empty() {
        return directories
            .iter()
            .enumerate()
            .map(|(i, directory)| ViewConfig {
                row: 0,
                column: i as i32,
                directory: directory.clone(),
                ..ViewConfig::default()
            })
            .collect();
    }
    if settings.views.is_empty() {
        vec![ViewConfig::default()]
    } else {
        settings.views.clone()
    }
}

pub fn describe(event: &ViewEvent) -> String {
    match event {
        ViewEvent::Loaded {
            view,
            path,
            entries,
        } => format!("{view} loaded {} ({entries} items)", path.display()),
        ViewEvent::Refreshed {
            view,
            path,
            entries,
        } => format!("{view} refreshed {} ({entries} items)", path.display()),
        ViewEvent::RefreshFailed { view, path, reason } => {
            format!("{view} could not refresh {}: {reason}", path.display())
        }
        ViewEvent::Closed { view } => format!("{view} closed"),
    }
}

pub async fn run_watch(
    settings: &Settings,
    directories: &[PathBuf],
    no_watch: bool,
) -> anyhow::Result<()> {
    let mut builder = ViewHub::builder()
        .refresh_interval(Duration::from_millis(settings.refresh.interval_ms))
        .history_depth(settings.history.max_depth);
    if no_watch {
        builder = builder.without_live_refresh();
    }
    let hub = builder.build();
    let mut events = hub.subscribe();

    let mut views: Vec<Arc<DirectoryView>> = Vec::new();
    for config in view_configs(settings, directories) {
        if directories.is_empty() {
            views.push(hub.open_view_from(&config));
            continue;
        }
        let view = hub.open_view();
        view.load_directory(&config.directory, true)
            .with_context(|| format!("cannot open {}", config.directory.display()))?;
        views.push(view);
    }

    crate::log_event!("watch", "started", "{} views", views.len());
    eprintln!("Watching {} view(s). Press Ctrl+C to stop.", views.len());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Received shutdown signal");
                break;
            }
            received = events.recv() => match received {
                Ok(event) => println!("{}", describe(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[watch] dropped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    for view in &views {
        view.close();
    }
    hub.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ViewId;

    #[test]
    fn test_explicit_directories_override_saved_views() {
        let mut settings = Settings::default();
        settings.views.push(ViewConfig {
            directory: PathBuf::from("/saved"),
            ..ViewConfig::default()
        });

        let configs = view_configs(&settings, &[PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[1].directory, PathBuf::from("/b"));
        assert_eq!(configs[1].column, 1);

        let saved = view_configs(&settings, &[]);
        assert_eq!(saved[0].directory, PathBuf::from("/saved"));
    }

    #[test]
    fn test_no_saved_views_opens_default() {
        let configs = view_configs(&Settings::default(), &[]);
        assert_eq!(configs, vec![ViewConfig::default()]);
    }

    #[test]
    fn test_describe_refresh_failure() {
        let event = ViewEvent::RefreshFailed {
            view: ViewId::new(2).unwrap(),
            path: PathBuf::from("/gone"),
            reason: "not found".to_string(),
        };
        assert_eq!(describe(&event), "view#2 could not refresh /gone: not found");
    }
}
