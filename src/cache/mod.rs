//! The tree-shaped decision cache and its invalidation machinery.
//!
//! Cached entries mirror the entity hierarchy: every entry records its
//! parent relation(s) at insertion and the keys that depend on it, so that
//! removing or evicting a node cascades to every descendant. Two key
//! namespaces coexist: entity rule keys (does this level carry rules, and
//! which) and identity decision keys (the resolved access of one identity
//! anchored at one level).
//!
//! Loads and invalidations are serialized by a fair reader/writer barrier:
//! any number of loads proceed concurrently, but a rule change drains all
//! in-flight loads before it edits the tree.

mod barrier;
mod invalidator;
mod key;
mod tree;

pub use barrier::{LoadBarrier, LoadPermit, SuspendGuard};
pub use invalidator::RulesInvalidator;
pub use key::CacheKey;
pub use tree::{CacheEntry, CacheStats, InsertError, RightsCache};
