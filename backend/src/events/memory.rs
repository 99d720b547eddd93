use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{EventPublisher, ListEvent, PublishError};

/// Keeps every published event in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    events: Arc<Mutex<Vec<ListEvent>>>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<ListEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, event: &ListEvent) -> Result<(), PublishError> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Rejects every event.
#[derive(Debug, Clone, Default)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, event: &ListEvent) -> Result<(), PublishError> {
        Err(PublishError::Transport {
            event: event.event.clone(),
            message: "publisher is down".to_string(),
        })
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListKind, ReaderId, ReaderList};

    #[tokio::test]
    async fn test_records_events_in_order() {
        let publisher = InMemoryPublisher::new();
        for kind in [ListKind::Favorites, ListKind::UsedRead] {
            let event = ListEvent::from_list(ReaderList {
                reader_id: ReaderId::new(7),
                kind,
                books: vec![],
            });
            publisher.publish(&event).await.unwrap();
        }

        let names: Vec<String> = publisher.published().into_iter().map(|e| e.event).collect();
        assert_eq!(names, vec!["favorite_books", "used_read"]);
    }
}
