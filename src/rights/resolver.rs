//! Hierarchical conflict resolution.
//!
//! The resolver folds the rule sets of a whole entity chain into one final
//! [`AccessLevel`]:
//! - rules at the same level that disagree are arbitrated by the per-right
//!   tie-break table;
//! - levels that disagree are arbitrated by the per-right inheritance
//!   direction ("smaller wins");
//! - an ALLOW rule that governs a right at a level but names neither the
//!   identity nor any of its groups is an implicit deny at that level
//!   (closed world);
//! - rights left undetermined fall back to their baked-in defaults, and a
//!   final ADMIN or PROGRAM fans out its implied rights.
//!
//! Resolution is deterministic and, apart from logging, side-effect-free:
//! the same inputs always intern to the same [`AccessLevel`].

use std::borrow::Borrow;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::bridge::IdentityBridge;
use crate::error::Result;
use crate::types::{EntityKind, EntityRef, FarmId, GroupId, Identity};

use super::access::{AccessLevel, AccessLevelBuilder};
use super::rules::RuleEntry;
use super::types::{HierarchyLevel, Right, RightState};

/// Resolves the access of one identity on one entity from the raw rule
/// sets of the entity's chain.
///
/// The resolver owns no cache and no rule storage; it only consults the
/// injected [`IdentityBridge`] for the super-administrator, creator, and
/// owner predicates.
pub struct AccessResolver {
    identity: Arc<dyn IdentityBridge>,
    main_farm: FarmId,
}

impl AccessResolver {
    pub fn new(identity: Arc<dyn IdentityBridge>, main_farm: FarmId) -> Self {
        Self {
            identity,
            main_farm,
        }
    }

    /// Resolves the final access level.
    ///
    /// # Arguments
    ///
    /// * `user` - The identity to resolve access for
    /// * `target` - The entity access is being resolved on
    /// * `memberships` - The identity's group memberships, already
    ///   flattened transitively by the caller
    /// * `entries` - The rule sets of the target's resolution chain, in
    ///   root-to-leaf order
    pub fn resolve<E: Borrow<RuleEntry>>(
        &self,
        user: &Identity,
        target: &EntityRef,
        memberships: &IndexSet<GroupId>,
        entries: &[E],
    ) -> Result<AccessLevel> {
        if self.identity.is_super_admin(user)? {
            debug!("Resolved super-administrator access for [{}]", user);
            return Ok(AccessLevel::all_allow());
        }

        let mut accumulated = AccessLevel::builder();

        // Seed target-bound grants before walking the chain: the creator of
        // a document may delete it, the owner of a farm administers it.
        if target.kind() == EntityKind::Document && self.identity.is_creator(user, target)? {
            accumulated.set(Right::Delete, RightState::Allow);
        }
        if self.identity.is_owner(user, target.farm())? {
            accumulated.set(Right::Admin, RightState::Allow);
        }

        // Walk leaf to root so the most specific level is folded first.
        for entry in entries.iter().rev() {
            let entry = entry.borrow();
            let level = HierarchyLevel::of(&entry.entity, &self.main_farm);
            let current = settle_level(user, memberships, entry, level);
            merge_level(&mut accumulated, &current, level);
        }

        accumulated.fill_defaults();
        apply_implied_rights(&mut accumulated);

        let resolved = accumulated.build();
        debug!(
            "Resolved access for [{}] on [{}]: {}",
            user, target, resolved
        );
        Ok(resolved)
    }
}

/// Folds every rule of one level into a level-local decision per right.
fn settle_level(
    user: &Identity,
    memberships: &IndexSet<GroupId>,
    entry: &RuleEntry,
    level: HierarchyLevel,
) -> AccessLevelBuilder {
    let mut current = AccessLevel::builder();

    for right in Right::enabled_at(level).iter() {
        let mut saw_allow_rule = false;

        for rule in &entry.rules {
            if !rule.governs(right) {
                continue;
            }
            if rule.state == RightState::Allow {
                saw_allow_rule = true;
            }
            if !rule.matches(user, memberships) {
                continue;
            }
            let previous = current.get(right);
            if previous == RightState::Undetermined {
                current.set(right, rule.state);
            } else if previous != rule.state {
                // Two matching rules disagree at the same level.
                trace!(
                    "Tie on [{}] at [{}], settled by policy as {}",
                    right,
                    entry.entity,
                    right.tie_break()
                );
                current.set(right, right.tie_break());
            }
        }

        // Closed world: an allow rule exists for this right at this level,
        // but the identity is not named by any matching rule.
        if current.get(right) == RightState::Undetermined && saw_allow_rule {
            current.set(right, RightState::Deny);
        }
    }

    current
}

/// Merges one level-local decision into the running result. The walk is
/// leaf-first, so the accumulated value is always the more specific one.
fn merge_level(
    accumulated: &mut AccessLevelBuilder,
    current: &AccessLevelBuilder,
    level: HierarchyLevel,
) {
    for right in Right::enabled_at(level).iter() {
        let incoming = current.get(right);
        if incoming == RightState::Undetermined {
            continue;
        }
        let held = accumulated.get(right);
        if held == RightState::Undetermined {
            accumulated.set(right, incoming);
        } else if held != incoming {
            if right.smaller_wins() {
                // The deeper level decided first and keeps the right.
            } else {
                // Bigger wins: the ancestor's determination prevails, in
                // both directions. A descendant cannot grant the right
                // against an ancestor DENY, nor suppress an ancestor ALLOW.
                accumulated.set(right, incoming);
            }
        }
    }
}

/// Fans out implied rights. Implied grants are additive: they only ever
/// write ALLOW.
fn apply_implied_rights(accumulated: &mut AccessLevelBuilder) {
    for source in [Right::Admin, Right::Program] {
        if accumulated.get(source) == RightState::Allow {
            for implied in source.implied_rights().iter() {
                accumulated.set(implied, RightState::Allow);
            }
        }
    }
}
