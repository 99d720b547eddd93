//! Application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ListCache;
use crate::db::repository::FullRepository;
use crate::events::{EventPublisher, FanoutPublisher};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FullRepository>,
    pub cache: Arc<dyn ListCache>,
    /// Publishes list events and feeds `/events` subscribers
    pub events: FanoutPublisher,
    /// Keep-alive interval of the `/events` stream
    pub keep_alive: Duration,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        cache: Arc<dyn ListCache>,
        publisher: Arc<dyn EventPublisher>,
        feed_capacity: usize,
    ) -> Self {
        Self {
            repository,
            cache,
            events: FanoutPublisher::new(publisher, feed_capacity),
            keep_alive: Duration::from_secs(15),
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
