use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::SearchQuery;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// In-process cache for ranked search results
///
/// Values are stored as serialized JSON so callers can cache any
/// serde type. Entries live for `ttl_secs`.
pub struct SearchCache {
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl SearchCache {
    pub fn new(l1_size: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { l1_cache, ttl_secs }
    }

    /// Get a value from cache
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.l1_cache.get(key).await {
            Some(bytes) => {
                tracing::trace!("Cache hit: {}", key);
                Ok(serde_json::from_slice(&bytes)?)
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Err(CacheError::CacheMiss(key.to_string()))
            }
        }
    }

    /// Set a value in cache
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.l1_cache.insert(key.to_string(), bytes).await;
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Drop every cached result
    pub fn invalidate_all(&self) {
        self.l1_cache.invalidate_all();
        tracing::debug!("Invalidated search cache");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.l1_cache.entry_count(),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: u64,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a search; tokens are normalized so
    /// "Cardio  BOSTON" and "cardio boston" share an entry.
    ///
    /// `boosted` lists the doctors whose boost grants placement at search
    /// time, so results computed under a different boost set never match.
    pub fn search(query: &SearchQuery, boosted: &[&str]) -> String {
        format!(
            "search:{}:{}:{}:{}:{}",
            query.tokens().join(" "),
            query
                .specialty
                .as_deref()
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_default(),
            query.available_only,
            query.limit,
            boosted.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_get() {
        tokio_test::block_on(async {
            let cache = SearchCache::new(100, 60);

            cache.set("k", &vec![1, 2, 3]).await.unwrap();
            let result: Vec<i32> = cache.get("k").await.unwrap();
            assert_eq!(result, vec![1, 2, 3]);

            cache.invalidate_all();
            assert!(cache.get::<Vec<i32>>("k").await.is_err());
        });
    }

    #[test]
    fn test_cache_key_builder() {
        let mut query = SearchQuery::new("Cardio  BOSTON");
        query.limit = 20;
        assert_eq!(CacheKey::search(&query, &[]), "search:cardio boston::false:20:");

        query.specialty = Some(" Cardiology ".to_string());
        query.available_only = true;
        assert_eq!(
            CacheKey::search(&query, &["doc-a", "doc-b"]),
            "search:cardio boston:cardiology:true:20:doc-a,doc-b"
        );
    }

    #[test]
    fn test_cache_stats() {
        tokio_test::block_on(async {
            let cache = SearchCache::new(100, 45);
            cache.set("k", &1).await.unwrap();
            let stats = cache.stats();
            assert_eq!(stats.ttl_secs, 45);
        });
    }
}
