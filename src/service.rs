//! The public decision facade.
//!
//! [`RightsService`] orchestrates cache lookup, rule loading, resolution,
//! and cache store. A lookup walks the entity chain against cached rule
//! entries: a no-rules marker sends it to the parent, a cached decision
//! ends it, an absent level triggers a full load. Loads run under the read
//! side of the shared barrier and are restarted, up to a configured bound,
//! when the cache reports a structural race.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use tracing::{debug, error, warn};

use crate::bridge::{GroupBridge, IdentityBridge, RuleReader};
use crate::cache::{
    CacheEntry, CacheKey, CacheStats, InsertError, LoadBarrier, RightsCache, RulesInvalidator,
};
use crate::error::{Result, RightsError};
use crate::rights::{AccessLevel, AccessResolver, Right, RuleEntry};
use crate::types::{EntityKind, EntityRef, FarmId, GroupId, Identity, Page, Subject};

/// Configuration for the rights service.
#[derive(Debug, Clone)]
pub struct RightsConfig {
    /// The distinguished main farm rooting every resolution chain.
    pub main_farm: FarmId,

    /// Maximum number of entries in the decision cache.
    pub cache_capacity: usize,

    /// Optional time-to-live for cache entries, applied on read.
    pub cache_ttl: Option<Duration>,

    /// How many times a load is restarted on structural races before the
    /// lookup fails.
    pub max_load_retries: usize,

    /// Window size for paginated group directory calls.
    pub group_page_size: usize,
}

impl RightsConfig {
    pub fn new(main_farm: FarmId) -> Self {
        Self {
            main_farm,
            cache_capacity: 500,
            cache_ttl: None,
            max_load_retries: 5,
            group_page_size: 100,
        }
    }
}

impl Default for RightsConfig {
    fn default() -> Self {
        Self::new(FarmId::new("main"))
    }
}

/// Outcome of one load attempt.
enum LoadFailure {
    /// A structural race; the whole load should be restarted.
    Retry(InsertError),
    /// A real failure; surfaced to the caller.
    Fatal(RightsError),
}

type Attempt<T> = std::result::Result<T, LoadFailure>;

/// The public decision API.
///
/// The service is `Send + Sync` and meant to be shared across worker
/// threads; every lookup either answers from the cache or blocks its
/// calling thread for the duration of one load.
pub struct RightsService {
    config: RightsConfig,
    cache: Arc<RightsCache>,
    barrier: Arc<LoadBarrier>,
    rules: Arc<dyn RuleReader>,
    groups: Arc<dyn GroupBridge>,
    identity: Arc<dyn IdentityBridge>,
    resolver: AccessResolver,
}

impl RightsService {
    pub fn new(
        config: RightsConfig,
        rules: Arc<dyn RuleReader>,
        groups: Arc<dyn GroupBridge>,
        identity: Arc<dyn IdentityBridge>,
    ) -> Self {
        let cache = Arc::new(RightsCache::new(config.cache_capacity, config.cache_ttl));
        let barrier = Arc::new(LoadBarrier::new());
        let resolver = AccessResolver::new(Arc::clone(&identity), config.main_farm.clone());
        Self {
            config,
            cache,
            barrier,
            rules,
            groups,
            identity,
            resolver,
        }
    }

    /// An invalidator wired to this service's cache and barrier. Feed it
    /// the document change notification stream.
    pub fn invalidator(&self) -> RulesInvalidator {
        RulesInvalidator::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.barrier),
            Arc::clone(&self.groups),
            self.config.group_page_size,
        )
    }

    /// Whether the identity holds the given right on the entity.
    pub fn has_access(&self, right: Right, user: &Identity, entity: &EntityRef) -> Result<bool> {
        Ok(self.resolve(user, entity)?.allows(right))
    }

    /// Like [`has_access`], but fail-closed: any error is logged and
    /// answered with DENY, never ALLOW-by-default.
    ///
    /// [`has_access`]: RightsService::has_access
    pub fn check(&self, right: Right, user: &Identity, entity: &EntityRef) -> bool {
        match self.has_access(right, user, entity) {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(
                    "Denying [{}] for [{}] on [{}] after error: {}",
                    right, user, entity, err
                );
                false
            }
        }
    }

    /// The full resolved access level of one identity on one entity, for
    /// batch and diagnostic callers.
    pub fn resolve(&self, user: &Identity, entity: &EntityRef) -> Result<AccessLevel> {
        let mut attempts = 0;
        while attempts < self.config.max_load_retries {
            attempts += 1;
            let _permit = self.barrier.begin_load();
            match self.try_resolve(user, entity) {
                Ok(level) => return Ok(level),
                Err(LoadFailure::Retry(reason)) => {
                    debug!(
                        "Restarting load for [{}] on [{}] after attempt {}: {}",
                        user, entity, attempts, reason
                    );
                }
                Err(LoadFailure::Fatal(err)) => return Err(err),
            }
        }
        error!("Failed to load the cache in {} attempts. Giving up.", attempts);
        Err(RightsError::LoadRetriesExhausted { attempts })
    }

    /// Removes the cached subtree of one entity.
    pub fn invalidate(&self, entity: &EntityRef) {
        let _suspend = self.barrier.suspend();
        self.cache.remove_entity(entity);
    }

    /// Removes one cached decision.
    pub fn invalidate_access(&self, user: &Identity, entity: &EntityRef) {
        let _suspend = self.barrier.suspend();
        self.cache.remove_access(user, entity);
    }

    /// Returns decision cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// One pass over the cached chain: answer from a cached decision,
    /// climb over no-rules markers, or fall into a full load.
    fn try_resolve(&self, user: &Identity, entity: &EntityRef) -> Attempt<AccessLevel> {
        let chain = entity.resolution_chain(&self.config.main_farm);
        for level in &chain {
            let own_farm_root = matches!(level, EntityRef::Farm(farm) if farm == entity.farm());
            match self.cache.get_rules(level) {
                None => return self.load(user, entity, &chain),
                Some(rules) => {
                    if let Some(access) = self.cache.get_access(user, level) {
                        return Ok(access);
                    }
                    // A level without rules defers to its parent; decisions
                    // never anchor above the entity's own farm root.
                    if rules.is_empty() && !own_farm_root {
                        continue;
                    }
                    return self.load(user, entity, &chain);
                }
            }
        }
        self.load(user, entity, &chain)
    }

    /// Full load: fetch rules for every level of the chain, expand group
    /// memberships, resolve, and store the decision.
    fn load(&self, user: &Identity, entity: &EntityRef, chain: &[EntityRef]) -> Attempt<AccessLevel> {
        debug!("Loading access for [{}] on [{}]", user, entity);

        // Root first, so every parent link exists before its child.
        let mut entries: Vec<Arc<RuleEntry>> = Vec::with_capacity(chain.len());
        let mut parent_key: Option<CacheKey> = None;
        for level in chain.iter().rev() {
            let entry = match self.cache.get_rules(level) {
                Some(entry) => entry,
                None => {
                    let rules = self
                        .rules
                        .read_rules(level)
                        .map_err(|err| LoadFailure::Fatal(err.into()))?;
                    let entry = Arc::new(RuleEntry::new(level.clone(), rules));
                    self.cache
                        .add(
                            CacheKey::entity(level),
                            parent_key.iter().cloned().collect(),
                            CacheEntry::Rules(Arc::clone(&entry)),
                        )
                        .map_err(LoadFailure::Retry)?;
                    entry
                }
            };
            entries.push(entry);
            parent_key = Some(CacheKey::entity(level));
        }
        // entries is now in root-to-leaf order, as the resolver expects.

        let memberships = self
            .expand_groups(user, entity.farm())
            .map_err(LoadFailure::Fatal)?;
        let access = self
            .resolver
            .resolve(user, entity, &memberships, &entries)
            .map_err(LoadFailure::Fatal)?;

        let anchor = self
            .anchor_for(user, entity, &entries)
            .map_err(LoadFailure::Fatal)?;
        match self.cache.add(
            CacheKey::access(user, &anchor),
            vec![CacheKey::entity(&anchor)],
            CacheEntry::Access(access.clone()),
        ) {
            Ok(()) => Ok(access),
            Err(err) => {
                debug!(
                    "Discarding computed access for [{}] on [{}]: {}",
                    user, entity, err
                );
                Err(LoadFailure::Retry(err))
            }
        }
    }

    /// The level a decision is stored at: the deepest rule-bearing level
    /// of the chain, floored at the entity's own farm root so decisions
    /// are never shared across farms. Creator-seeded decisions are
    /// specific to the document and anchor at the document itself.
    fn anchor_for(
        &self,
        user: &Identity,
        entity: &EntityRef,
        entries: &[Arc<RuleEntry>],
    ) -> Result<EntityRef> {
        if entity.kind() == EntityKind::Document && self.identity.is_creator(user, entity)? {
            return Ok(entity.clone());
        }
        for entry in entries.iter().rev() {
            if entry.entity.farm() != entity.farm() {
                // Above the entity's own farm root (main-farm portion of a
                // secondary farm's chain).
                continue;
            }
            if !entry.is_empty() {
                return Ok(entry.entity.clone());
            }
        }
        Ok(EntityRef::Farm(entity.farm().clone()))
    }

    /// Flattens the identity's transitive group memberships, within the
    /// entity's farm and, for secondary farms, the main farm as well.
    /// Already-seen groups are never re-expanded, so membership cycles
    /// terminate.
    fn expand_groups(&self, user: &Identity, farm: &FarmId) -> Result<IndexSet<GroupId>> {
        let mut farms = vec![farm.clone()];
        if farm != &self.config.main_farm {
            farms.push(self.config.main_farm.clone());
        }

        let mut memberships: IndexSet<GroupId> = IndexSet::new();
        let mut pending: VecDeque<Subject> = VecDeque::new();
        pending.push_back(Subject::User(user.clone()));

        while let Some(subject) = pending.pop_front() {
            for farm in &farms {
                let mut page = Page::first(self.config.group_page_size);
                loop {
                    let groups = self.groups.groups_of(&subject, farm, page)?;
                    let last_window = groups.len() < page.limit;
                    for group in groups {
                        if memberships.insert(group.clone()) {
                            pending.push_back(Subject::Group(group));
                        }
                    }
                    if last_window {
                        break;
                    }
                    page = page.next();
                }
            }
        }
        Ok(memberships)
    }
}
