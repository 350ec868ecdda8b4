//! Process-local cache of final scrape results.
//!
//! One instance per process, shared by reference with the orchestrator.
//! Every operation runs under a single lock, so purge + lookup and
//! insert + evict are each observed as one step.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use harvest_common::{Config, ScrapeResult};
use lru::LruCache;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub capacity: usize,
    pub success_ttl: Duration,
    pub failure_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 200,
            success_ttl: Duration::from_secs(30 * 60),
            failure_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            capacity: config.cache_capacity,
            success_ttl: config.cache_success_ttl,
            failure_ttl: config.cache_failure_ttl,
        }
    }
}

struct CacheEntry {
    expires_at: Instant,
    value: ScrapeResult,
}

pub struct ScrapeCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    settings: CacheSettings,
}

impl ScrapeCache {
    pub fn new(settings: CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            settings,
        }
    }

    /// Purge everything expired, then look `url` up. A hit becomes the most
    /// recently used entry.
    pub fn get(&self, url: &str) -> Option<ScrapeResult> {
        let key = normalize_url(url);
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("scrape cache lock poisoned");

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for k in &expired {
            entries.pop(k);
        }
        if !expired.is_empty() {
            debug!(purged = expired.len(), "Purged expired scrape cache entries");
        }

        entries.get(&key).map(|e| e.value.clone())
    }

    /// Insert or overwrite. Failures get the shorter TTL. The least recently
    /// used entry is evicted once capacity is reached.
    pub fn insert(&self, url: &str, value: ScrapeResult) {
        let ttl = if value.is_failure() {
            self.settings.failure_ttl
        } else {
            self.settings.success_ttl
        };
        let entry = CacheEntry {
            expires_at: Instant::now() + ttl,
            value,
        };
        let key = normalize_url(url);
        let mut entries = self.entries.lock().expect("scrape cache lock poisoned");
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                debug!(evicted = evicted.as_str(), "Evicted scrape cache entry");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("scrape cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache key for `url`: scheme and host lower-cased, fragment dropped, path
/// and query kept. Unparsable input is used as-is after trimming.
pub fn normalize_url(url: &str) -> String {
    match url::Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}
