//! Raw rule records and per-level rule sets.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::types::{EntityRef, GroupId, Identity};

use super::types::{Right, RightSet, RightState};

/// One rule record attached to one hierarchy level: an allow or deny rule
/// over a set of rights, naming users and groups it applies to.
///
/// Several rule records can coexist at one level and may conflict; the
/// resolver arbitrates via the per-right tie-break table. User and group
/// sets preserve declaration order so iteration is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightsObject {
    /// The effect of this rule: `Allow` or `Deny`. `Undetermined` is not a
    /// valid rule state.
    pub state: RightState,

    /// The rights this rule governs.
    pub rights: RightSet,

    /// Users this rule names.
    #[serde(default)]
    pub users: IndexSet<Identity>,

    /// Groups this rule names.
    #[serde(default)]
    pub groups: IndexSet<GroupId>,
}

impl RightsObject {
    pub fn new(state: RightState, rights: RightSet) -> Self {
        Self {
            state,
            rights,
            users: IndexSet::new(),
            groups: IndexSet::new(),
        }
    }

    pub fn with_user(mut self, user: Identity) -> Self {
        self.users.insert(user);
        self
    }

    pub fn with_group(mut self, group: GroupId) -> Self {
        self.groups.insert(group);
        self
    }

    /// Whether this rule governs the given right at all.
    pub fn governs(&self, right: Right) -> bool {
        self.rights.contains(right)
    }

    /// Whether the identity is named by this rule, directly or through one
    /// of its (already flattened) group memberships.
    pub fn matches(&self, user: &Identity, memberships: &IndexSet<GroupId>) -> bool {
        if self.users.contains(user) {
            return true;
        }
        self.groups.iter().any(|g| memberships.contains(g))
    }

    /// Checks that the record is a usable rule: a determined state and a
    /// non-empty right set.
    pub fn validate(&self) -> Result<(), String> {
        if self.state == RightState::Undetermined {
            return Err("rule state must be allow or deny".to_string());
        }
        if self.rights.is_empty() {
            return Err("rule must govern at least one right".to_string());
        }
        Ok(())
    }
}

/// The rule records attached to one hierarchy level. An empty entry is the
/// cached marker for "this level has no rule objects".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub entity: EntityRef,
    pub rules: Vec<RightsObject>,
}

impl RuleEntry {
    pub fn new(entity: EntityRef, rules: Vec<RightsObject>) -> Self {
        Self { entity, rules }
    }

    /// A marker entry for a level without rules.
    pub fn empty(entity: EntityRef) -> Self {
        Self {
            entity,
            rules: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
