//! Bounded, expiring cache of memory-mapped log files.
//!
//! This module provides:
//! - [`MappedFileCache`] — path → mapping cache with LRU eviction and a TTL
//! - [`MappedContent`] — read-only view over one mapped file
//! - [`FileLease`] — shared handle returned to callers
//!
//! A single mutex covers lookup, recency update, mapping and eviction. Expiry
//! is checked lazily on [`MappedFileCache::get`]; nothing sweeps stale entries
//! in the background, so an entry that is never requested again is only
//! released by a later `get` for the same path, an explicit invalidation, or
//! [`MappedFileCache::clear`].
//!
//! Callers receive an [`Arc`] lease. Evicting an entry drops the cache's
//! reference only; the mapping is unmapped when the last lease is dropped.

use std::collections::HashMap;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use memmap2::Mmap;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{LogError, Result};

/// Shared, reference-counted view of a mapped file.
pub type FileLease = Arc<MappedContent>;

/// Read-only content of one file. Empty files are not mapped.
#[derive(Debug)]
pub struct MappedContent {
    map: Option<Mmap>,
}

impl MappedContent {
    /// Maps `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the file cannot be opened or mapped.
    #[allow(unsafe_code)]
    pub fn map(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| LogError::io(path, e))?;
        let len = file.metadata().map_err(|e| LogError::io(path, e))?.len();
        if len == 0 {
            return Ok(Self { map: None });
        }

        // SAFETY: log files are append-only. Appends past the mapped length are
        // invisible to this mapping; truncating a mapped file is outside the
        // writer contract.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| LogError::io(path, e))?;
        Ok(Self { map: Some(map) })
    }

    /// Returns the mapped bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

impl Deref for MappedContent {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for MappedContent {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Counters for cache diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from a live entry.
    pub hits: u64,
    /// Lookups that had to map the file.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Entries dropped because their TTL had passed.
    pub expirations: u64,
}

struct Node {
    path: PathBuf,
    content: FileLease,
    expires_at: Instant,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly-linked recency list stored in a slab, most recent at the head.
#[derive(Default)]
struct LruList {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruList {
    fn node(&self, idx: usize) -> Option<&Node> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    fn push_front(&mut self, node: Node) -> usize {
        let idx = if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(node);
            idx
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        };
        self.link_front(idx);
        idx
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(head) = self.node_mut(h) {
                    head.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.node(idx).map(|n| (n.prev, n.next)) else {
            return;
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = None;
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn remove(&mut self, idx: usize) -> Option<Node> {
        self.node(idx)?;
        self.unlink(idx);
        let node = self.slots[idx].take();
        self.free.push(idx);
        node
    }

    fn back(&self) -> Option<usize> {
        self.tail
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }
}

#[derive(Default)]
struct CacheState {
    index: HashMap<PathBuf, usize>,
    lru: LruList,
    stats: CacheStats,
}

impl CacheState {
    fn remove(&mut self, idx: usize) -> Option<Node> {
        let node = self.lru.remove(idx)?;
        self.index.remove(&node.path);
        Some(node)
    }
}

/// Bounded LRU cache of mapped files with per-entry expiry.
pub struct MappedFileCache {
    max_size: usize,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl MappedFileCache {
    /// Creates a cache holding at most `max_size` mappings, each for `ttl`.
    #[must_use]
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            max_size,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the content of `path`, mapping it on a miss.
    ///
    /// A live entry becomes the most recently used. An expired entry is
    /// dropped and the file is mapped again. Inserting beyond capacity evicts
    /// exactly one least-recently-used entry.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the file cannot be opened or mapped.
    pub fn get(&self, path: &Path) -> Result<FileLease> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = Instant::now();

        if let Some(&idx) = state.index.get(path) {
            let expired = state.lru.node(idx).is_some_and(|n| now >= n.expires_at);
            if expired {
                state.remove(idx);
                state.stats.expirations += 1;
                debug!(path = %path.display(), "mapped file expired");
            } else {
                state.lru.move_to_front(idx);
                if let Some(node) = state.lru.node(idx) {
                    state.stats.hits += 1;
                    return Ok(Arc::clone(&node.content));
                }
            }
        }

        state.stats.misses += 1;
        let content = Arc::new(MappedContent::map(path)?);
        debug!(path = %path.display(), bytes = content.len(), "mapped file");

        let idx = state.lru.push_front(Node {
            path: path.to_path_buf(),
            content: Arc::clone(&content),
            expires_at: now + self.ttl,
            prev: None,
            next: None,
        });
        state.index.insert(path.to_path_buf(), idx);

        if state.index.len() > self.max_size {
            if let Some(victim) = state.lru.back().and_then(|v| state.remove(v)) {
                state.stats.evictions += 1;
                debug!(path = %victim.path.display(), "evicted mapped file");
            }
        }

        Ok(content)
    }

    /// Drops the entry for `path`, if any. Returns true if one was removed.
    pub fn invalidate(&self, path: &Path) -> bool {
        let mut state = self.state.lock();
        match state.index.get(path).copied() {
            Some(idx) => state.remove(idx).is_some(),
            None => false,
        }
    }

    /// Keeps only entries for which `keep` returns true. Returns how many were
    /// dropped.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&Path, &MappedContent) -> bool,
    {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let doomed: Vec<usize> = state
            .index
            .values()
            .copied()
            .filter(|&idx| {
                state
                    .lru
                    .node(idx)
                    .is_some_and(|n| !keep(&n.path, &n.content))
            })
            .collect();

        doomed
            .into_iter()
            .filter(|&idx| state.remove(idx).is_some())
            .count()
    }

    /// Releases every entry. Outstanding leases stay readable.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.index.clear();
        state.lru.clear();
    }

    /// Returns true if `path` has an entry, live or expired.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.state.lock().index.contains_key(path)
    }

    /// Returns the number of cached mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the per-entry time to live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}
