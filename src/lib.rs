//! # Hierarchical Rights Engine (hierights)
//!
//! A reusable decision engine that grants or denies named capabilities
//! ("rights") to identities on hierarchically organized resources: a
//! document nested in a space, nested in a tenant farm. It provides:
//! - A closed right taxonomy with frozen conflict-resolution policy tables
//! - Deterministic resolution of conflicting rules across hierarchy levels
//! - A tree-shaped, capacity-bounded decision cache with cascading
//!   invalidation
//! - A fair load/invalidation barrier keeping the cache and the rule store
//!   consistent under concurrent lookups
//!
//! Rule storage, group membership, and ownership predicates are external
//! collaborators injected through the [`bridge`] traits.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hierights::{
//!     DocumentRef, EntityRef, FarmId, GroupBridge, GroupId, Identity, IdentityBridge, Page,
//!     Right, RightSet, RightState, RightsConfig, RightsObject, RightsService, RuleReader,
//!     Subject,
//! };
//!
//! // Rules live at the farm root only: the "staff" group may edit.
//! struct StaticRules;
//!
//! impl RuleReader for StaticRules {
//!     fn read_rules(&self, entity: &EntityRef) -> anyhow::Result<Vec<RightsObject>> {
//!         Ok(match entity {
//!             EntityRef::Farm(_) => vec![
//!                 RightsObject::new(RightState::Allow, RightSet::of(&[Right::Edit]))
//!                     .with_group(GroupId::new("staff")),
//!             ],
//!             _ => vec![],
//!         })
//!     }
//! }
//!
//! struct StaticGroups;
//!
//! impl GroupBridge for StaticGroups {
//!     fn groups_of(
//!         &self,
//!         subject: &Subject,
//!         _farm: &FarmId,
//!         _page: Page,
//!     ) -> anyhow::Result<Vec<GroupId>> {
//!         Ok(match subject {
//!             Subject::User(user) if user.as_str() == "alice" => vec![GroupId::new("staff")],
//!             _ => vec![],
//!         })
//!     }
//!
//!     fn members_of(&self, _group: &GroupId, _page: Page) -> anyhow::Result<Vec<Identity>> {
//!         Ok(vec![])
//!     }
//!
//!     fn group_defined_by(&self, _document: &DocumentRef) -> Option<GroupId> {
//!         None
//!     }
//! }
//!
//! struct NoSpecialUsers;
//!
//! impl IdentityBridge for NoSpecialUsers {
//!     fn is_super_admin(&self, _user: &Identity) -> anyhow::Result<bool> {
//!         Ok(false)
//!     }
//!
//!     fn is_creator(&self, _user: &Identity, _document: &EntityRef) -> anyhow::Result<bool> {
//!         Ok(false)
//!     }
//!
//!     fn is_owner(&self, _user: &Identity, _farm: &FarmId) -> anyhow::Result<bool> {
//!         Ok(false)
//!     }
//! }
//!
//! let service = RightsService::new(
//!     RightsConfig::default(),
//!     Arc::new(StaticRules),
//!     Arc::new(StaticGroups),
//!     Arc::new(NoSpecialUsers),
//! );
//!
//! let readme = EntityRef::Document(DocumentRef::new(FarmId::new("main"), "Eng", "Readme"));
//! assert!(service.check(Right::Edit, &Identity::new("alice"), &readme));
//! assert!(!service.check(Right::Admin, &Identity::new("alice"), &readme));
//! ```

pub mod bridge;
pub mod cache;
pub mod error;
pub mod rights;
pub mod service;
pub mod types;

pub use bridge::{GroupBridge, IdentityBridge, RuleReader};
pub use cache::{
    CacheEntry, CacheKey, CacheStats, InsertError, LoadBarrier, RightsCache, RulesInvalidator,
};
pub use error::{Result, RightsError};
pub use rights::{
    AccessLevel, AccessResolver, HierarchyLevel, Right, RightSet, RightState, RightsObject,
    RuleEntry,
};
pub use service::{RightsConfig, RightsService};
pub use types::{
    DocumentEvent, DocumentEventKind, DocumentRef, EntityKind, EntityRef, FarmId, GroupId,
    Identity, Page, Subject,
};
