//! View event broadcasting.
//!
//! Views publish what they did here; the presentation context subscribes and
//! redraws. Nothing in the core waits on subscribers.

use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::types::ViewId;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A navigation finished and the view shows `path`.
    Loaded {
        view: ViewId,
        path: PathBuf,
        entries: usize,
    },
    /// A silent refresh re-listed the current directory.
    Refreshed {
        view: ViewId,
        path: PathBuf,
        entries: usize,
    },
    /// A silent refresh could not list the current directory.
    RefreshFailed {
        view: ViewId,
        path: PathBuf,
        reason: String,
    },
    Closed { view: ViewId },
}

impl ViewEvent {
    pub fn view(&self) -> ViewId {
        match self {
            ViewEvent::Loaded { view, .. }
            | ViewEvent::Refreshed { view, .. }
            | ViewEvent::RefreshFailed { view, .. }
            | ViewEvent::Closed { view } => *view,
        }
    }
}

/// Fans view events out to any number of listeners.
#[derive(Clone)]
pub struct ViewBroadcaster {
    sender: broadcast::Sender<ViewEvent>,
}

impl ViewBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all subscribers
    pub fn send(&self, event: ViewEvent) {
        match self.sender.send(event) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "to {count} subscribers");
            }
            Err(broadcast::error::SendError(event)) => {
                // No receivers, this is fine
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ViewBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_subscribers_is_fine() {
        let broadcaster = ViewBroadcaster::new(4);
        broadcaster.send(ViewEvent::Closed {
            view: ViewId::new(1).unwrap(),
        });
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_receives_events() {
        let broadcaster = ViewBroadcaster::new(4);
        let mut rx = broadcaster.subscribe();
        let view = ViewId::new(3).unwrap();

        broadcaster.send(ViewEvent::Refreshed {
            view,
            path: PathBuf::from("/tmp"),
            entries: 2,
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.view(), view);
        assert!(matches!(event, ViewEvent::Refreshed { entries: 2, .. }));
    }
}
