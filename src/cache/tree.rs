//! The capacity-bounded cache tree.
//!
//! One LRU-ordered store holds both rule entries and decision entries,
//! together with the parent/child index that mirrors the entity hierarchy.
//! The value store and the tree index are only ever mutated together,
//! under a single mutex, so they cannot drift apart; reads take the same
//! mutex because a read refreshes LRU recency, which is itself a
//! structural mutation.
//!
//! Structural races are surfaced, never papered over: inserting under a
//! parent that has been evicted fails with [`InsertError::ParentEvicted`],
//! and inserting different content over an existing key fails with
//! [`InsertError::Conflicting`]. Both tell the caller to restart the whole
//! load, because the missing or conflicting entry may reflect rule data
//! that has changed since the load began.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error};

use crate::rights::{AccessLevel, RuleEntry};
use crate::types::{EntityRef, Identity};

use super::key::CacheKey;

/// A retryable structural failure during an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    /// A required parent entry is no longer cached. The parent may reflect
    /// rule data that has changed; the whole load must be restarted.
    #[error("a required parent entry was evicted before the insert completed")]
    ParentEvicted,

    /// Another writer holds this key with different content, or the insert
    /// evicted its own subtree. The current writer's result is stale.
    #[error("conflicting insertion for an already cached key")]
    Conflicting,
}

/// Tagged value stored in one cache slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The rules attached to one entity level; an empty rule set is the
    /// marker for "no rule objects here".
    Rules(Arc<RuleEntry>),

    /// A final resolved access level.
    Access(AccessLevel),
}

/// Cache statistics for monitoring performance.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// One slot of the store: the tagged value plus the tree index data. The
/// node owns no domain knowledge; parents and children exist purely so
/// that removal can cascade.
struct Node {
    entry: CacheEntry,
    parents: Vec<CacheKey>,
    children: HashSet<CacheKey>,
    stored_at: Instant,
}

type Store = LruCache<CacheKey, Node>;

/// The tree-shaped rights cache.
///
/// # Thread Safety
///
/// All operations lock one internal mutex; the cache can be shared freely
/// across worker threads. Load/invalidation ordering is the business of
/// [`LoadBarrier`](super::LoadBarrier), not of this type.
pub struct RightsCache {
    inner: Mutex<Store>,
    capacity: usize,
    ttl: Option<Duration>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl RightsCache {
    /// Creates a cache bounded to `capacity` entries, with an optional
    /// time-to-live applied on read.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(LruCache::unbounded()),
            capacity,
            ttl,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// The cached rule entry of one entity level, if present.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds a decision entry: the two key namespaces
    /// are disjoint, so a mixed-up slot means the cache is corrupted and
    /// must not answer security questions.
    pub fn get_rules(&self, entity: &EntityRef) -> Option<Arc<RuleEntry>> {
        let key = CacheKey::entity(entity);
        match self.get_entry(&key)? {
            CacheEntry::Rules(rules) => Some(rules),
            CacheEntry::Access(_) => {
                error!("Corrupted rights cache: decision entry under rule key [{}]", key);
                panic!("corrupted rights cache: decision entry under rule key {}", key);
            }
        }
    }

    /// The cached decision of one identity anchored at one entity level.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds a rule entry, like [`get_rules`] in
    /// reverse.
    ///
    /// [`get_rules`]: RightsCache::get_rules
    pub fn get_access(&self, identity: &Identity, entity: &EntityRef) -> Option<AccessLevel> {
        let key = CacheKey::access(identity, entity);
        match self.get_entry(&key)? {
            CacheEntry::Access(level) => Some(level),
            CacheEntry::Rules(_) => {
                error!("Corrupted rights cache: rule entry under decision key [{}]", key);
                panic!("corrupted rights cache: rule entry under decision key {}", key);
            }
        }
    }

    /// Inserts an entry, recording its parent relation(s) before the value
    /// is stored.
    ///
    /// Re-inserting equal content is a no-op (redundant concurrent loads
    /// converge); differing content fails with
    /// [`InsertError::Conflicting`]; a missing parent fails with
    /// [`InsertError::ParentEvicted`]. On success the store is trimmed
    /// back to capacity, cascading evictions like explicit removals.
    pub fn add(
        &self,
        key: CacheKey,
        parents: Vec<CacheKey>,
        entry: CacheEntry,
    ) -> Result<(), InsertError> {
        let mut store = self.inner.lock();

        if self.ensure_live(&mut store, &key) {
            let existing = store.get(&key).map(|node| node.entry.clone());
            if existing.as_ref() == Some(&entry) {
                debug!("Entry [{}] already cached with equal content", key);
                return Ok(());
            }
            debug!("Conflicting insertion for [{}], discarding new content", key);
            return Err(InsertError::Conflicting);
        }

        for parent in &parents {
            if !self.ensure_live(&mut store, parent) {
                debug!("Parent [{}] missing while inserting [{}]", parent, key);
                return Err(InsertError::ParentEvicted);
            }
            // Touch the parent so it is not the next eviction victim.
            store.get(parent);
        }
        for parent in &parents {
            if let Some(node) = store.peek_mut(parent) {
                node.children.insert(key.clone());
            }
        }

        store.push(
            key.clone(),
            Node {
                entry,
                parents,
                children: HashSet::new(),
                stored_at: Instant::now(),
            },
        );
        debug!("Added entry [{}] into the cache", key);

        self.enforce_capacity(&mut store);
        if !store.contains(&key) {
            // The eviction triggered by this insert reached the inserted
            // entry itself (directly or through an ancestor).
            debug!("Entry [{}] evicted while being added", key);
            return Err(InsertError::Conflicting);
        }
        Ok(())
    }

    /// Removes a key and, transitively, every entry that depends on it.
    /// Children go first, then the key detaches from its parents and is
    /// deleted: always leaf-to-root within the removed subtree.
    pub fn remove(&self, key: &CacheKey) {
        let mut store = self.inner.lock();
        Self::remove_subtree(&mut store, key);
    }

    /// Removes the rule entry of one entity level and its whole subtree.
    pub fn remove_entity(&self, entity: &EntityRef) {
        self.remove(&CacheKey::entity(entity));
    }

    /// Removes one cached decision.
    pub fn remove_access(&self, identity: &Identity, entity: &EntityRef) {
        self.remove(&CacheKey::access(identity, entity));
    }

    /// Removes every cached decision of one identity, wherever it is
    /// anchored. Used when group membership changes: the identity's
    /// resolved access changes without any rule entry changing.
    pub fn remove_identity(&self, identity: &Identity) {
        let mut store = self.inner.lock();
        let keys: Vec<CacheKey> = store
            .iter()
            .filter(|(key, _)| key.is_access_for(identity))
            .map(|(key, _)| key.clone())
            .collect();
        debug!(
            "Removing {} cached decision(s) for identity [{}]",
            keys.len(),
            identity
        );
        for key in &keys {
            Self::remove_subtree(&mut store, key);
        }
    }

    /// Drops every entry and resets statistics.
    pub fn clear(&self) {
        self.inner.lock().clear();
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            size,
            hit_count: hits,
            miss_count: misses,
            hit_rate,
        }
    }

    fn get_entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut store = self.inner.lock();
        if !self.ensure_live(&mut store, key) {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            debug!("Miss read for [{}]", key);
            return None;
        }
        let entry = store.get(key).map(|node| node.entry.clone());
        if entry.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            debug!("Success read for [{}]", key);
        }
        entry
    }

    /// Returns whether the key is present and not expired; an expired
    /// entry is removed, together with its subtree, before reporting
    /// absence.
    fn ensure_live(&self, store: &mut Store, key: &CacheKey) -> bool {
        let expired = match store.peek(key) {
            None => return false,
            Some(node) => self.ttl.is_some_and(|ttl| node.stored_at.elapsed() > ttl),
        };
        if expired {
            debug!("Entry [{}] expired, removing its subtree", key);
            Self::remove_subtree(store, key);
            return false;
        }
        true
    }

    /// Evicts least-recently-used entries until the store fits the
    /// configured capacity. Every eviction cascades exactly like an
    /// explicit removal.
    fn enforce_capacity(&self, store: &mut Store) {
        while store.len() > self.capacity {
            if let Some((key, node)) = store.pop_lru() {
                debug!("Evicting [{}] under capacity pressure", key);
                for child in &node.children {
                    Self::remove_subtree(store, child);
                }
                for parent in &node.parents {
                    if let Some(parent_node) = store.peek_mut(parent) {
                        parent_node.children.remove(&key);
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Removes a subtree leaf-first: children recursively, then the key is
    /// detached from its parents' child sets and deleted.
    fn remove_subtree(store: &mut Store, key: &CacheKey) {
        let children: Vec<CacheKey> = match store.peek(key) {
            Some(node) => node.children.iter().cloned().collect(),
            None => return,
        };
        for child in &children {
            Self::remove_subtree(store, child);
        }
        if let Some(node) = store.pop(key) {
            for parent in &node.parents {
                if let Some(parent_node) = store.peek_mut(parent) {
                    parent_node.children.remove(key);
                }
            }
            debug!("Removed entry [{}] from the cache", key);
        }
    }
}
