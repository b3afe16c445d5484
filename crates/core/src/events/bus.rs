use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::LifecycleEvent;

/// In-process event bus backed by `tokio::broadcast`, carrying lifecycle
/// events from the HTTP hook routes to the sync worker.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<LifecycleEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers. Fails when nobody is
    /// subscribed, i.e. the sync worker is not running.
    pub fn publish(
        &self,
        event: LifecycleEvent,
    ) -> Result<usize, broadcast::error::SendError<LifecycleEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ItemKey;
    use crate::events::types::{DeleteEvent, LifecycleKind};

    fn delete(key: &str) -> LifecycleEvent {
        LifecycleEvent::new(LifecycleKind::Delete(DeleteEvent {
            keys: vec![ItemKey::parse(key).unwrap()],
        }))
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let sent = delete("abc");
        bus.publish(sent.clone()).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.id, sent.id);
        assert!(matches!(event.kind, LifecycleKind::Delete(_)));
    }

    #[tokio::test]
    async fn publish_without_subscribers_fails() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.publish(delete("abc")).is_err());
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(delete("abc")).unwrap();

        assert!(matches!(rx1.recv().await.unwrap().kind, LifecycleKind::Delete(_)));
        assert!(matches!(rx2.recv().await.unwrap().kind, LifecycleKind::Delete(_)));
    }
}
