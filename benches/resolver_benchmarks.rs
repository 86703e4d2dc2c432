use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use indexmap::IndexSet;

use hierights::{
    AccessLevel, AccessResolver, CacheEntry, CacheKey, DocumentRef, EntityRef, FarmId, GroupId,
    Identity, IdentityBridge, Right, RightSet, RightState, RightsCache, RightsObject, RuleEntry,
};

struct NobodyBridge;

impl IdentityBridge for NobodyBridge {
    fn is_super_admin(&self, _user: &Identity) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn is_creator(&self, _user: &Identity, _document: &EntityRef) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn is_owner(&self, _user: &Identity, _farm: &FarmId) -> anyhow::Result<bool> {
        Ok(false)
    }
}

fn entry_with_rules(entity: EntityRef, rules_per_level: usize) -> RuleEntry {
    let rules = (0..rules_per_level)
        .map(|i| {
            let state = if i % 2 == 0 {
                RightState::Allow
            } else {
                RightState::Deny
            };
            RightsObject::new(state, RightSet::of(&[Right::View, Right::Edit]))
                .with_user(Identity::new(format!("user{}", i)))
                .with_group(GroupId::new(format!("group{}", i)))
        })
        .collect();
    RuleEntry::new(entity, rules)
}

fn chain(rules_per_level: usize) -> Vec<RuleEntry> {
    vec![
        entry_with_rules(EntityRef::Farm(FarmId::new("main")), rules_per_level),
        entry_with_rules(
            EntityRef::Space {
                farm: FarmId::new("main"),
                space: "Eng".to_string(),
            },
            rules_per_level,
        ),
        entry_with_rules(
            EntityRef::Document(DocumentRef::new(FarmId::new("main"), "Eng", "Readme")),
            rules_per_level,
        ),
    ]
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = AccessResolver::new(Arc::new(NobodyBridge), FarmId::new("main"));
    let target = EntityRef::Document(DocumentRef::new(FarmId::new("main"), "Eng", "Readme"));
    let user = Identity::new("user0");
    let mut memberships = IndexSet::new();
    memberships.insert(GroupId::new("group1"));

    let mut group = c.benchmark_group("resolve");
    for rules_per_level in [0usize, 4, 16, 64] {
        let entries = chain(rules_per_level);
        group.bench_with_input(
            BenchmarkId::from_parameter(rules_per_level),
            &entries,
            |b, entries| {
                b.iter(|| {
                    resolver
                        .resolve(
                            black_box(&user),
                            black_box(&target),
                            black_box(&memberships),
                            entries,
                        )
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let cache = RightsCache::new(500, None);
    let farm = EntityRef::Farm(FarmId::new("main"));
    let user = Identity::new("alice");
    cache
        .add(
            CacheKey::entity(&farm),
            vec![],
            CacheEntry::Rules(Arc::new(entry_with_rules(farm.clone(), 4))),
        )
        .unwrap();
    cache
        .add(
            CacheKey::access(&user, &farm),
            vec![CacheKey::entity(&farm)],
            CacheEntry::Access(AccessLevel::defaults()),
        )
        .unwrap();

    c.bench_function("cache_access_hit", |b| {
        b.iter(|| cache.get_access(black_box(&user), black_box(&farm)))
    });
}

fn bench_cache_add_remove_chain(c: &mut Criterion) {
    let farm = EntityRef::Farm(FarmId::new("main"));
    let space = EntityRef::Space {
        farm: FarmId::new("main"),
        space: "Eng".to_string(),
    };
    let doc = EntityRef::Document(DocumentRef::new(FarmId::new("main"), "Eng", "Readme"));

    c.bench_function("cache_add_remove_chain", |b| {
        let cache = RightsCache::new(500, None);
        b.iter(|| {
            cache
                .add(
                    CacheKey::entity(&farm),
                    vec![],
                    CacheEntry::Rules(Arc::new(RuleEntry::empty(farm.clone()))),
                )
                .unwrap();
            cache
                .add(
                    CacheKey::entity(&space),
                    vec![CacheKey::entity(&farm)],
                    CacheEntry::Rules(Arc::new(RuleEntry::empty(space.clone()))),
                )
                .unwrap();
            cache
                .add(
                    CacheKey::entity(&doc),
                    vec![CacheKey::entity(&space)],
                    CacheEntry::Rules(Arc::new(RuleEntry::empty(doc.clone()))),
                )
                .unwrap();
            cache.remove_entity(black_box(&farm));
        });
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_cache_hit,
    bench_cache_add_remove_chain
);
criterion_main!(benches);
