use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{CacheError, CacheResult, ListCache};

/// In-process list cache used when no Redis URL is configured.
#[derive(Debug, Clone)]
pub struct MemoryListCache {
    lists: Arc<RwLock<HashMap<String, Vec<String>>>>,
    available: Arc<AtomicBool>,
}

impl MemoryListCache {
    pub fn new() -> Self {
        Self {
            lists: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Make every call fail as if the backend had gone away.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Current contents of `key`, bypassing availability.
    pub fn snapshot(&self, key: &str) -> Option<Vec<String>> {
        self.lists.read().get(key).cloned()
    }

    /// Overwrite `key` directly, for seeding tests with stale or corrupt data.
    pub fn seed(&self, key: &str, elements: Vec<String>) {
        self.lists.write().insert(key.to_string(), elements);
    }

    fn ensure_available(&self) -> CacheResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable(
                "memory cache marked unavailable".to_string(),
            ))
        }
    }
}

impl Default for MemoryListCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListCache for MemoryListCache {
    async fn read_list(&self, key: &str) -> CacheResult<Vec<String>> {
        self.ensure_available()?;
        Ok(self.lists.read().get(key).cloned().unwrap_or_default())
    }

    async fn replace_list(&self, key: &str, elements: &[String]) -> CacheResult<()> {
        self.ensure_available()?;
        let mut lists = self.lists.write();
        if elements.is_empty() {
            lists.remove(key);
        } else {
            lists.insert(key.to_string(), elements.to_vec());
        }
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.ensure_available()?;
        self.lists.write().remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
