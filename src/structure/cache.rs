//! LRU cache of fetched page structure with time-based staleness

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use lru::LruCache;

use super::types::PageStructure;

/// Identifies one page of one document
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub document: String,
    /// Page number, 1-based
    pub page: u32,
}

impl PageKey {
    pub fn new(document: impl Into<String>, page: u32) -> Self {
        Self {
            document: document.into(),
            page,
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#page={}", self.document, self.page)
    }
}

struct CachedStructure {
    structure: Arc<PageStructure>,
    fetched_at: Instant,
}

/// LRU cache for page structure, entries expire after `ttl`
pub struct StructureCache {
    cache: LruCache<PageKey, CachedStructure>,
    ttl: Duration,
}

impl StructureCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            ttl,
        }
    }

    /// Fresh entry for `key`, promoting it in LRU order. Stale entries are evicted.
    pub fn get(&mut self, key: &PageKey, now: Instant) -> Option<Arc<PageStructure>> {
        let fresh = match self.cache.get(key) {
            Some(entry) => now.saturating_duration_since(entry.fetched_at) < self.ttl,
            None => {
                debug!("Structure cache miss for {key}");
                return None;
            }
        };

        if fresh {
            debug!("Structure cache hit for {key}");
            self.cache.get(key).map(|entry| entry.structure.clone())
        } else {
            debug!("Structure cache entry for {key} expired");
            self.cache.pop(key);
            None
        }
    }

    /// Check if a fresh entry exists without promoting it
    #[must_use]
    pub fn contains_fresh(&self, key: &PageKey, now: Instant) -> bool {
        self.cache
            .peek(key)
            .is_some_and(|entry| now.saturating_duration_since(entry.fetched_at) < self.ttl)
    }

    pub fn insert(
        &mut self,
        key: PageKey,
        structure: PageStructure,
        now: Instant,
    ) -> Arc<PageStructure> {
        let arc = Arc::new(structure);
        self.cache.put(
            key,
            CachedStructure {
                structure: arc.clone(),
                fetched_at: now,
            },
        );
        arc
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Drop every cached page of one document
    pub fn invalidate_document(&mut self, document: &str) {
        let keys_to_remove: Vec<_> = self
            .cache
            .iter()
            .filter(|(k, _)| k.document == document)
            .map(|(k, _)| k.clone())
            .collect();

        for key in keys_to_remove {
            self.cache.pop(&key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
