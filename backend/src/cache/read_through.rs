//! Read-through helper over a [`ListCache`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

use super::{CacheError, ListCache};

/// Return the list cached at `key`, or load it with `loader` and cache it.
///
/// A non-empty cached list is decoded and returned without calling `loader`.
/// On an empty key the loader runs once, its rows are encoded and written
/// back with a single atomic replace, and exactly those rows are returned.
/// If any cached element fails to decode the whole list is treated as a
/// miss. Errors from the cache or the loader are returned as-is; nothing is
/// retried.
pub async fn get_list<T, E, F, Fut>(cache: &dyn ListCache, key: &str, loader: F) -> Result<Vec<T>, E>
where
    T: Serialize + DeserializeOwned,
    E: From<CacheError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let cached = cache.read_list(key).await?;
    if !cached.is_empty() {
        match decode_all::<T>(&cached) {
            Ok(items) => {
                tracing::debug!(key, count = items.len(), "list cache hit");
                return Ok(items);
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding undecodable cached list");
            }
        }
    } else {
        tracing::debug!(key, "list cache miss");
    }

    let rows = loader().await?;
    let encoded = rows
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CacheError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
    cache.replace_list(key, &encoded).await?;
    Ok(rows)
}

fn decode_all<T: DeserializeOwned>(elements: &[String]) -> serde_json::Result<Vec<T>> {
    elements.iter().map(|raw| serde_json::from_str(raw)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryListCache;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
        name: String,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: 1,
                name: "Asimov".to_string(),
            },
            Row {
                id: 2,
                name: "Le Guin".to_string(),
            },
        ]
    }

    async fn load(calls: &AtomicUsize) -> Result<Vec<Row>, CacheError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(rows())
    }

    #[tokio::test]
    async fn test_miss_populates_cache_with_loaded_rows() {
        let cache = MemoryListCache::new();
        let calls = AtomicUsize::new(0);

        let out: Vec<Row> = get_list(&cache, "author:menu", || load(&calls))
            .await
            .unwrap();

        assert_eq!(out, rows());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stored = cache.snapshot("author:menu").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(
            serde_json::from_str::<Row>(&stored[1]).unwrap(),
            rows()[1]
        );
    }

    #[tokio::test]
    async fn test_hit_does_not_call_loader() {
        let cache = MemoryListCache::new();
        let calls = AtomicUsize::new(0);
        get_list::<Row, CacheError, _, _>(&cache, "k", || load(&calls))
            .await
            .unwrap();
        let again: Vec<Row> = get_list(&cache, "k", || load(&calls)).await.unwrap();

        assert_eq!(again, rows());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_triggers_rebuild() {
        let cache = MemoryListCache::new();
        cache.seed("k", vec!["{not json".to_string()]);
        let calls = AtomicUsize::new(0);

        let out: Vec<Row> = get_list(&cache, "k", || load(&calls)).await.unwrap();

        assert_eq!(out, rows());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.snapshot("k").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cache_failure_is_returned() {
        let cache = MemoryListCache::new();
        cache.set_available(false);
        let calls = AtomicUsize::new(0);

        let result: Result<Vec<Row>, CacheError> = get_list(&cache, "k", || load(&calls)).await;

        assert!(matches!(result, Err(CacheError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
