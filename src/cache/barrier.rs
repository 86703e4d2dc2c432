//! The load/invalidation barrier.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A fair reader/writer barrier serializing cache loads against rule
/// invalidation.
///
/// Loads are readers: any number proceed concurrently, each holding a
/// permit for the whole load, external calls included. Invalidation is the
/// writer: it drains every in-flight load before editing the tree, and no
/// load starts while it runs. This is deliberately coarse (one barrier
/// for the whole cache, not per key), trading contention for correctness;
/// the write side itself stays short: pure key removal plus member
/// enumeration.
///
/// `parking_lot`'s lock is eventually fair and writer-preferring, so a
/// steady stream of loads cannot starve an invalidation.
#[derive(Default)]
pub struct LoadBarrier {
    lock: RwLock<()>,
}

/// Held by a load for its whole duration.
pub struct LoadPermit<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

/// Held by an invalidation while it edits the tree.
pub struct SuspendGuard<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
}

impl LoadBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks while an invalidation is in progress, then admits the load.
    pub fn begin_load(&self) -> LoadPermit<'_> {
        LoadPermit {
            _guard: self.lock.read(),
        }
    }

    /// Blocks until every in-flight load has drained, then excludes new
    /// ones until the guard is dropped.
    pub fn suspend(&self) -> SuspendGuard<'_> {
        SuspendGuard {
            _guard: self.lock.write(),
        }
    }
}
