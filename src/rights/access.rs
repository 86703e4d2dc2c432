//! Resolved access levels and their canonical interning.

use dashmap::DashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use super::types::{Right, RightState};

type StateTable = [RightState; Right::COUNT];

/// Canonical instances, one per distinct right-to-state content. The table
/// is bounded by the number of distinct state combinations and is never
/// evicted.
static INTERNER: OnceLock<DashMap<StateTable, AccessLevel>> = OnceLock::new();

fn interner() -> &'static DashMap<StateTable, AccessLevel> {
    INTERNER.get_or_init(DashMap::new)
}

/// The fully resolved decision for one (identity, entity) pair: a frozen
/// mapping from every [`Right`] to a [`RightState`].
///
/// Instances are interned: two access levels with identical content share
/// one allocation, so clones and equality checks are cheap no matter how
/// often the same decision is cached.
///
/// # Examples
///
/// ```
/// use hierights::{AccessLevel, Right, RightState};
///
/// let defaults = AccessLevel::defaults();
/// assert_eq!(defaults.get(Right::View), RightState::Allow);
/// assert_eq!(defaults.get(Right::Admin), RightState::Deny);
///
/// // Equal content, same canonical instance.
/// let again = AccessLevel::defaults();
/// assert_eq!(defaults, again);
/// ```
#[derive(Debug, Clone)]
pub struct AccessLevel(Arc<StateTable>);

impl AccessLevel {
    /// An access level holding every right's baked-in default.
    pub fn defaults() -> AccessLevel {
        let mut builder = AccessLevel::builder();
        for right in Right::ALL {
            builder.set(right, right.default_state());
        }
        builder.build()
    }

    /// The super-administrator access level: every resolvable right is
    /// allowed; the sentinel stays denied.
    pub fn all_allow() -> AccessLevel {
        let mut builder = AccessLevel::builder();
        for right in Right::RESOLVABLE {
            builder.set(right, RightState::Allow);
        }
        builder.set(Right::Illegal, RightState::Deny);
        builder.build()
    }

    /// A mutable working copy used while a resolution is in flight.
    pub fn builder() -> AccessLevelBuilder {
        AccessLevelBuilder {
            states: [RightState::Undetermined; Right::COUNT],
        }
    }

    /// The resolved state of one right.
    pub fn get(&self, right: Right) -> RightState {
        self.0[right.ordinal()]
    }

    /// True when the right resolved to ALLOW.
    pub fn allows(&self, right: Right) -> bool {
        self.get(right) == RightState::Allow
    }
}

impl PartialEq for AccessLevel {
    fn eq(&self, other: &Self) -> bool {
        // Interning makes pointer equality the common case.
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for AccessLevel {}

impl Hash for AccessLevel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        write!(f, "{{")?;
        for right in Right::ALL {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}={}", right, self.get(right))?;
        }
        write!(f, "}}")
    }
}

/// Working copy of an access level under construction. [`build`] returns
/// the canonical instance for the accumulated content.
///
/// [`build`]: AccessLevelBuilder::build
#[derive(Debug, Clone)]
pub struct AccessLevelBuilder {
    states: StateTable,
}

impl AccessLevelBuilder {
    pub fn get(&self, right: Right) -> RightState {
        self.states[right.ordinal()]
    }

    pub fn set(&mut self, right: Right, state: RightState) {
        self.states[right.ordinal()] = state;
    }

    /// Replaces every still-undetermined slot with the right's baked-in
    /// default.
    pub fn fill_defaults(&mut self) {
        for right in Right::ALL {
            if self.get(right) == RightState::Undetermined {
                self.set(right, right.default_state());
            }
        }
    }

    /// Returns the canonical instance for this content.
    pub fn build(self) -> AccessLevel {
        interner()
            .entry(self.states)
            .or_insert_with(|| AccessLevel(Arc::new(self.states)))
            .clone()
    }
}
