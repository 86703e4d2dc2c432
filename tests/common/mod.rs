//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use hierights::{
    DocumentRef, EntityRef, FarmId, GroupBridge, GroupId, Identity, IdentityBridge, Page,
    RightsConfig, RightsObject, RightsService, RuleReader, Subject,
};

/// A mutable in-memory backend standing in for rule storage, the group
/// directory, and the identity store.
#[derive(Default)]
pub struct InMemoryWorld {
    pub rules: Mutex<HashMap<EntityRef, Vec<RightsObject>>>,
    pub memberships: Mutex<HashMap<(Subject, FarmId), Vec<GroupId>>>,
    pub members: Mutex<HashMap<GroupId, Vec<Identity>>>,
    pub group_docs: Mutex<HashMap<DocumentRef, GroupId>>,
    pub super_admins: Mutex<HashSet<Identity>>,
    pub creators: Mutex<HashSet<(Identity, EntityRef)>>,
    pub owners: Mutex<HashSet<(Identity, FarmId)>>,
    /// Counts rule fetches, to observe caching behavior.
    pub rule_reads: AtomicUsize,
    /// When set, every rule fetch fails.
    pub fail_rule_reads: Mutex<bool>,
}

impl InMemoryWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_rule(&self, entity: EntityRef, rule: RightsObject) {
        self.rules.lock().unwrap().entry(entity).or_default().push(rule);
    }

    pub fn set_memberships(&self, subject: Subject, farm: FarmId, groups: Vec<GroupId>) {
        self.memberships.lock().unwrap().insert((subject, farm), groups);
    }

    pub fn set_members(&self, group: GroupId, members: Vec<Identity>) {
        self.members.lock().unwrap().insert(group, members);
    }

    pub fn define_group_doc(&self, document: DocumentRef, group: GroupId) {
        self.group_docs.lock().unwrap().insert(document, group);
    }

    pub fn reads(&self) -> usize {
        self.rule_reads.load(Ordering::SeqCst)
    }
}

fn window<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    items
        .iter()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect()
}

impl RuleReader for InMemoryWorld {
    fn read_rules(&self, entity: &EntityRef) -> anyhow::Result<Vec<RightsObject>> {
        if *self.fail_rule_reads.lock().unwrap() {
            anyhow::bail!("rule storage unavailable");
        }
        self.rule_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rules
            .lock()
            .unwrap()
            .get(entity)
            .cloned()
            .unwrap_or_default())
    }
}

impl GroupBridge for InMemoryWorld {
    fn groups_of(
        &self,
        subject: &Subject,
        farm: &FarmId,
        page: Page,
    ) -> anyhow::Result<Vec<GroupId>> {
        let memberships = self.memberships.lock().unwrap();
        let groups = memberships
            .get(&(subject.clone(), farm.clone()))
            .cloned()
            .unwrap_or_default();
        Ok(window(&groups, page))
    }

    fn members_of(&self, group: &GroupId, page: Page) -> anyhow::Result<Vec<Identity>> {
        let members = self.members.lock().unwrap();
        let all = members.get(group).cloned().unwrap_or_default();
        Ok(window(&all, page))
    }

    fn group_defined_by(&self, document: &DocumentRef) -> Option<GroupId> {
        self.group_docs.lock().unwrap().get(document).cloned()
    }
}

impl IdentityBridge for InMemoryWorld {
    fn is_super_admin(&self, user: &Identity) -> anyhow::Result<bool> {
        Ok(self.super_admins.lock().unwrap().contains(user))
    }

    fn is_creator(&self, user: &Identity, document: &EntityRef) -> anyhow::Result<bool> {
        Ok(self
            .creators
            .lock()
            .unwrap()
            .contains(&(user.clone(), document.clone())))
    }

    fn is_owner(&self, user: &Identity, farm: &FarmId) -> anyhow::Result<bool> {
        Ok(self.owners.lock().unwrap().contains(&(user.clone(), farm.clone())))
    }
}

static TRACING: Once = Once::new();

/// Honors RUST_LOG for test diagnostics.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A service over the given world with default configuration.
pub fn service(world: &Arc<InMemoryWorld>) -> RightsService {
    service_with(world, RightsConfig::default())
}

pub fn service_with(world: &Arc<InMemoryWorld>, config: RightsConfig) -> RightsService {
    init_tracing();
    RightsService::new(
        config,
        Arc::clone(world) as Arc<dyn RuleReader>,
        Arc::clone(world) as Arc<dyn GroupBridge>,
        Arc::clone(world) as Arc<dyn IdentityBridge>,
    )
}

pub fn user(name: &str) -> Identity {
    Identity::new(name)
}

pub fn group(name: &str) -> GroupId {
    GroupId::new(name)
}

pub fn doc(farm: &str, space: &str, name: &str) -> EntityRef {
    EntityRef::Document(DocumentRef::new(FarmId::new(farm), space, name))
}

pub fn space(farm: &str, space: &str) -> EntityRef {
    EntityRef::Space {
        farm: FarmId::new(farm),
        space: space.to_string(),
    }
}

pub fn farm(name: &str) -> EntityRef {
    EntityRef::Farm(FarmId::new(name))
}
