use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{EventPublisher, ListEvent, PublishError};

/// `PUBLISH <event name> <json>` over a shared managed connection.
#[derive(Clone)]
pub struct RedisEventPublisher {
    connection: ConnectionManager,
}

impl RedisEventPublisher {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: &ListEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event).map_err(|e| PublishError::Encode {
            event: event.event.clone(),
            message: e.to_string(),
        })?;

        let mut conn = self.connection.clone();
        let receivers: i64 = conn
            .publish(event.channel(), payload)
            .await
            .map_err(|e| PublishError::Transport {
                event: event.event.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            channel = event.channel(),
            reader_id = %event.reader_id,
            receivers,
            "published list event"
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
