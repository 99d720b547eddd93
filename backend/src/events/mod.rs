//! Reader-list change events.
//!
//! After every list mutation the service re-reads the reader's full list of
//! that kind and publishes it as a [`ListEvent`] on the channel named by
//! [`ListKind::event_name`].

mod feed;
mod memory;
mod redis_pub;

pub use feed::FanoutPublisher;
pub use memory::{FailingPublisher, InMemoryPublisher};
pub use redis_pub::RedisEventPublisher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ListEntry, ListKind, ReaderId, ReaderList};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEvent {
    pub id: Uuid,
    /// Channel name, e.g. `favorite_books`.
    pub event: String,
    pub reader_id: ReaderId,
    pub kind: ListKind,
    pub books: Vec<ListEntry>,
    pub published_at: DateTime<Utc>,
}

impl ListEvent {
    pub fn from_list(list: ReaderList) -> Self {
        Self {
            id: Uuid::new_v4(),
            event: list.kind.event_name().to_string(),
            reader_id: list.reader_id,
            kind: list.kind,
            books: list.books,
            published_at: Utc::now(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.event
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode event {event}: {message}")]
    Encode { event: String, message: String },

    #[error("failed to publish event {event}: {message}")]
    Transport { event: String, message: String },
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &ListEvent) -> Result<(), PublishError>;

    fn backend(&self) -> &'static str;
}
