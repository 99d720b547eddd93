//! Redis-backed list cache.
//!
//! Each cache key is a Redis list of JSON strings. A rebuild is `DEL` followed
//! by `RPUSH` inside one `MULTI`/`EXEC` pipeline so readers never observe a
//! half-written list.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use serde::Deserialize;
use std::time::Duration;

use super::{CacheError, CacheResult, ListCache};

/// Connection settings for the `[redis]` config table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    /// `redis://host:port/db`; empty disables Redis.
    pub url: String,
    pub connect_timeout_ms: u64,
    pub retries: usize,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout_ms: 1000,
            retries: 1,
        }
    }
}

impl RedisSettings {
    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Open a managed connection; the manager reconnects on its own after drops.
pub async fn connect(settings: &RedisSettings) -> CacheResult<ConnectionManager> {
    let config = ConnectionManagerConfig::new().set_number_of_retries(settings.retries);
    let client = Client::open(settings.url.as_str())?;
    let timeout = Duration::from_millis(settings.connect_timeout_ms);

    match tokio::time::timeout(timeout, client.get_connection_manager_with_config(config)).await {
        Ok(manager) => Ok(manager?),
        Err(_) => Err(CacheError::Unavailable(format!(
            "timed out after {:?} connecting to redis",
            timeout
        ))),
    }
}

#[derive(Clone)]
pub struct RedisListCache {
    connection: ConnectionManager,
}

impl RedisListCache {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub async fn connect(settings: &RedisSettings) -> CacheResult<Self> {
        Ok(Self::new(connect(settings).await?))
    }
}

#[async_trait]
impl ListCache for RedisListCache {
    async fn read_list(&self, key: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let elements: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(elements)
    }

    async fn replace_list(&self, key: &str, elements: &[String]) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !elements.is_empty() {
            pipe.rpush(key, elements).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
