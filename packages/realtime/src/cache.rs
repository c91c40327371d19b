//! # Comment Cache
//!
//! Time and size bounded cache for fetched comment sets.
//!
//! Entries are keyed by [`CacheKey`] (a page, or one block on a page) and
//! hold the ordered comment list the store returned. Two bounds keep the
//! cache honest:
//!
//! - **Age**: an entry older than `max_age` is logically absent. Expiry is
//!   checked lazily on `get` and eagerly on every `set`, so a stale entry
//!   can never be observed even under low write volume.
//! - **Capacity**: past `max_size` entries, the oldest-written entries are
//!   evicted first.
//!
//! Invalidation is scoped through [`InvalidationScope`]: one entry, every
//! entry on a page, or the whole cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

/// A single comment on a page or block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,

    /// User who wrote the comment.
    pub author_id: String,

    pub body: String,

    /// Creation time in unix millis. Comment sets are ordered ascending by
    /// this; the cache preserves the order the store returned.
    pub created_at: i64,
}

/// Tuning for [`CommentCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries older than this are treated as absent.
    pub max_age: Duration,

    /// Maximum number of live entries. Oldest-written entries are evicted
    /// beyond this.
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(120),
            max_size: 20,
        }
    }
}

/// Scope of a cache invalidation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationScope {
    /// One page-level or block-scoped entry.
    Entry(CacheKey),

    /// Every entry on a page, the page-level one included.
    Page(String),

    /// The whole cache.
    All,
}

struct CacheEntry {
    comments: Vec<Comment>,
    written_at: Instant,
}

/// Bounded TTL cache for comment sets.
pub struct CommentCache {
    config: CacheConfig,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl CommentCache {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Fetch the cached comment set for a key.
    ///
    /// An entry past its age limit is removed on the way out and reported
    /// as absent.
    pub fn get(&mut self, key: &CacheKey) -> Option<&[Comment]> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.written_at.elapsed() > self.config.max_age,
            None => return None,
        };

        if expired {
            self.entries.remove(key);
            tracing::debug!(%key, "evicted expired comment set");
            return None;
        }

        self.entries.get(key).map(|entry| entry.comments.as_slice())
    }

    /// Store a freshly fetched comment set, replacing any previous entry
    /// for the key, then enforce both bounds.
    pub fn set(&mut self, key: CacheKey, comments: Vec<Comment>) {
        self.entries.insert(
            key,
            CacheEntry {
                comments,
                written_at: Instant::now(),
            },
        );
        self.cleanup();
    }

    /// Drop expired entries, then trim to capacity oldest-written first.
    ///
    /// Idempotent; never removes more than the bounds require.
    pub fn cleanup(&mut self) {
        let max_age = self.config.max_age;
        self.entries
            .retain(|_, entry| entry.written_at.elapsed() <= max_age);

        if self.entries.len() <= self.config.max_size {
            return;
        }

        let excess = self.entries.len() - self.config.max_size;
        let mut by_age: Vec<(CacheKey, Instant)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.written_at))
            .collect();
        by_age.sort_by_key(|(_, written_at)| *written_at);

        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
            tracing::debug!(%key, "evicted comment set over capacity");
        }
    }

    /// Remove one entry, every entry on a page, or everything.
    ///
    /// Total and synchronous; invalidating entries that do not exist is a
    /// no-op.
    pub fn invalidate(&mut self, scope: InvalidationScope) {
        match scope {
            InvalidationScope::Entry(key) => {
                self.entries.remove(&key);
            }
            InvalidationScope::Page(page_id) => {
                self.entries.retain(|key, _| !key.is_on_page(&page_id));
            }
            InvalidationScope::All => {
                self.entries.clear();
            }
        }
    }

    /// Whether a live (unexpired) entry exists for the key. Does not evict.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.written_at.elapsed() <= self.config.max_age)
            .unwrap_or(false)
    }

    /// Number of physically stored entries, expired ones included until the
    /// next cleanup pass.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommentCache {
    fn default() -> Self {
        Self::new()
    }
}
