//! Advisory list caches.
//!
//! A cache holds whole lists of JSON-encoded elements under a fixed key. The
//! store is the source of truth: any key may be dropped at any time and is
//! rebuilt by [`read_through::get_list`] on the next read.

mod memory;
pub mod read_through;
mod redis_store;

pub use memory::MemoryListCache;
pub use read_through::get_list;
pub use redis_store::{connect as connect_redis, RedisListCache, RedisSettings};

use async_trait::async_trait;
use thiserror::Error;

/// Every author, for menus and pickers.
pub const AUTHOR_MENU_KEY: &str = "author:menu";
/// Every book that has at least one author.
pub const BOOK_MENU_KEY: &str = "book:menu";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache command failed: {0}")]
    Command(String),

    #[error("failed to encode cache entry for '{key}': {message}")]
    Encode { key: String, message: String },
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key -> ordered list of encoded elements.
#[async_trait]
pub trait ListCache: Send + Sync {
    /// All elements at `key`; empty when the key is absent.
    async fn read_list(&self, key: &str) -> CacheResult<Vec<String>>;

    /// Drop whatever is at `key` and store `elements` in order, atomically.
    async fn replace_list(&self, key: &str, elements: &[String]) -> CacheResult<()>;

    async fn invalidate(&self, key: &str) -> CacheResult<()>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
