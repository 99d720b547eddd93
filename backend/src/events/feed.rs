use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{EventPublisher, ListEvent, PublishError};

/// Forwards to `inner`, then hands successfully published events to local
/// subscribers (the `/events` stream). Subscribers that fall behind lose the
/// oldest events.
#[derive(Clone)]
pub struct FanoutPublisher {
    inner: Arc<dyn EventPublisher>,
    feed: broadcast::Sender<ListEvent>,
}

impl FanoutPublisher {
    pub fn new(inner: Arc<dyn EventPublisher>, capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(capacity.max(1));
        Self { inner, feed }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.feed.subscribe()
    }
}

#[async_trait]
impl EventPublisher for FanoutPublisher {
    async fn publish(&self, event: &ListEvent) -> Result<(), PublishError> {
        self.inner.publish(event).await?;
        // No subscribers is not an error.
        let _ = self.feed.send(event.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        self.inner.backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FailingPublisher, InMemoryPublisher};
    use crate::models::{ListKind, ReaderId, ReaderList};

    fn event() -> ListEvent {
        ListEvent::from_list(ReaderList {
            reader_id: ReaderId::new(1),
            kind: ListKind::ReadLate,
            books: vec![],
        })
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let recorder = InMemoryPublisher::new();
        let fanout = FanoutPublisher::new(Arc::new(recorder.clone()), 8);
        let mut rx = fanout.subscribe();

        fanout.publish(&event()).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().event, "read_late");
        assert_eq!(recorder.published().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_publish_is_not_forwarded() {
        let fanout = FanoutPublisher::new(Arc::new(FailingPublisher), 8);
        let mut rx = fanout.subscribe();

        assert!(fanout.publish(&event()).await.is_err());
        assert!(rx.try_recv().is_err());
    }
}
