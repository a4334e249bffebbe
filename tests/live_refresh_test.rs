use std::fs;
use std::time::Duration;

use dirpane::{ViewEvent, ViewHub};
use tempfile::TempDir;
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_created_file_shows_up_without_navigation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().canonicalize().unwrap();
    let hub = ViewHub::builder()
        .refresh_interval(Duration::from_millis(50))
        .build();
    let mut events = hub.subscribe();

    let view = hub.open_view();
    view.load_directory(&path, true).unwrap();
    assert!(hub.scheduler().is_running());
    assert!(view.entries().is_empty());

    fs::write(path.join("arrived.txt"), b"hi").unwrap();

    let refreshed = timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(ViewEvent::Refreshed { view: id, .. }) if id == view.id() => {
                    if view.entries().iter().any(|e| e.name() == "arrived.txt") {
                        return true;
                    }
                }
                Ok(_) => {}
                Err(_) => return false,
            }
        }
    })
    .await;

    assert_eq!(refreshed, Ok(true));
    assert!(!view.can_go_back());
    hub.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recreated_directory_is_watched_again_after_reload() {
    let root = TempDir::new().unwrap();
    let path = root.path().canonicalize().unwrap().join("d");
    fs::create_dir(&path).unwrap();
    let hub = ViewHub::builder()
        .refresh_interval(Duration::from_millis(50))
        .build();

    let view = hub.open_view();
    view.load_directory(&path, true).unwrap();

    fs::remove_dir(&path).unwrap();
    fs::create_dir(&path).unwrap();
    view.load_directory(&path, false).unwrap();
    assert_eq!(view.watched_directory(), Some(path.clone()));

    // Let reloads queued by the delete and recreate run out first.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let mut events = hub.subscribe();

    fs::write(path.join("x.txt"), b"x").unwrap();

    let refreshed = timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(ViewEvent::Refreshed { view: id, .. }) if id == view.id() => {
                    if view.entries().iter().any(|e| e.name() == "x.txt") {
                        return true;
                    }
                }
                Ok(_) => {}
                Err(_) => return false,
            }
        }
    })
    .await;

    assert_eq!(refreshed, Ok(true));
    hub.shutdown();
}

#[tokio::test]
async fn test_no_watch_hub_never_refreshes() {
    let dir = TempDir::new().unwrap();
    let hub = ViewHub::builder()
        .refresh_interval(Duration::from_millis(20))
        .without_live_refresh()
        .build();
    let view = hub.open_view();
    view.load_directory(dir.path(), true).unwrap();

    fs::write(dir.path().join("late.txt"), b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(view.entries().is_empty());
    view.refresh().unwrap();
    assert_eq!(view.entries().len(), 1);
}
