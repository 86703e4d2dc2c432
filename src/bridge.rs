//! External collaborator boundaries.
//!
//! The engine never talks to storage directly: rule records, group
//! membership, and ownership predicates come through these traits,
//! injected at construction. Implementations are expected to block the
//! calling thread; failures are reported as `anyhow` errors and surface to
//! callers as decision failures (fail-closed).

use crate::rights::RightsObject;
use crate::types::{DocumentRef, EntityRef, FarmId, GroupId, Identity, Page, Subject};

/// Fetches the raw rule records attached directly to one hierarchy level.
pub trait RuleReader: Send + Sync {
    /// Returns the rule records of the given entity level only, without
    /// inherited rules. An entity without rules returns an empty list.
    fn read_rules(&self, entity: &EntityRef) -> anyhow::Result<Vec<RightsObject>>;
}

/// The external group directory.
pub trait GroupBridge: Send + Sync {
    /// The groups the subject is a direct member of within the given farm,
    /// one pagination window at a time. A result shorter than the window
    /// ends the enumeration.
    fn groups_of(
        &self,
        subject: &Subject,
        farm: &FarmId,
        page: Page,
    ) -> anyhow::Result<Vec<GroupId>>;

    /// The direct members of a group, one pagination window at a time.
    fn members_of(&self, group: &GroupId, page: Page) -> anyhow::Result<Vec<Identity>>;

    /// The group defined by the given document, if it is a group-definition
    /// document. Used by the invalidator: membership edits change every
    /// member's resolved access without touching any rule record.
    fn group_defined_by(&self, document: &DocumentRef) -> Option<GroupId>;
}

/// Identity and ownership predicates backed by external stores.
pub trait IdentityBridge: Send + Sync {
    /// Whether the identity is the distinguished super-administrator.
    fn is_super_admin(&self, user: &Identity) -> anyhow::Result<bool>;

    /// Whether the identity created the given document.
    fn is_creator(&self, user: &Identity, document: &EntityRef) -> anyhow::Result<bool>;

    /// Whether the identity owns the given farm.
    fn is_owner(&self, user: &Identity, farm: &FarmId) -> anyhow::Result<bool>;
}
