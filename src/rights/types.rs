//! The right taxonomy and its frozen policy tables.
//!
//! All policy is data, fixed at compile time and reachable through methods
//! on [`Right`]. There is no mutable global state: conflicting rules are
//! arbitrated by the same tables on every call.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{EntityRef, FarmId};

/// The state a rule assigns to a right, and the state a resolved right
/// ends up in.
///
/// `Undetermined` is the zero value: it only exists while a resolution is
/// in flight and is replaced by the right's baked-in default before the
/// result is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RightState {
    Allow,
    Deny,
    #[default]
    Undetermined,
}

impl fmt::Display for RightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RightState::Allow => "allow",
            RightState::Deny => "deny",
            RightState::Undetermined => "undetermined",
        };
        write!(f, "{}", name)
    }
}

/// The closed enumeration of rights.
///
/// `Illegal` is the sentinel for "no such right": it is never granted and
/// maps every unknown name in [`Right::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    Login,
    View,
    Edit,
    Delete,
    Comment,
    Register,
    Admin,
    Program,
    Illegal,
}

/// The hierarchy level a rule set is attached to. Secondary farm roots are
/// distinguished from the main farm root because some rights (PROGRAM) are
/// only meaningful farm-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyLevel {
    Document,
    Space,
    Farm,
    MainFarm,
}

impl HierarchyLevel {
    /// The level of an entity relative to the distinguished main farm.
    pub fn of(entity: &EntityRef, main_farm: &FarmId) -> Self {
        match entity {
            EntityRef::Document(_) => HierarchyLevel::Document,
            EntityRef::Space { .. } => HierarchyLevel::Space,
            EntityRef::Farm(farm) if farm == main_farm => HierarchyLevel::MainFarm,
            EntityRef::Farm(_) => HierarchyLevel::Farm,
        }
    }
}

impl Right {
    /// Number of rights, sentinel included.
    pub const COUNT: usize = 9;

    /// Every right in ordinal order, sentinel included.
    pub const ALL: [Right; Right::COUNT] = [
        Right::Login,
        Right::View,
        Right::Edit,
        Right::Delete,
        Right::Comment,
        Right::Register,
        Right::Admin,
        Right::Program,
        Right::Illegal,
    ];

    /// Every right that can actually be granted (sentinel excluded).
    pub const RESOLVABLE: [Right; 8] = [
        Right::Login,
        Right::View,
        Right::Edit,
        Right::Delete,
        Right::Comment,
        Right::Register,
        Right::Admin,
        Right::Program,
    ];

    /// Position of this right in [`Right::ALL`].
    pub fn ordinal(self) -> usize {
        match self {
            Right::Login => 0,
            Right::View => 1,
            Right::Edit => 2,
            Right::Delete => 3,
            Right::Comment => 4,
            Right::Register => 5,
            Right::Admin => 6,
            Right::Program => 7,
            Right::Illegal => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Right::Login => "login",
            Right::View => "view",
            Right::Edit => "edit",
            Right::Delete => "delete",
            Right::Comment => "comment",
            Right::Register => "register",
            Right::Admin => "admin",
            Right::Program => "program",
            Right::Illegal => "illegal",
        }
    }

    /// Parses a right name, case-insensitively. Unknown names map to the
    /// `Illegal` sentinel rather than an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use hierights::Right;
    ///
    /// assert_eq!(Right::from_name("edit"), Right::Edit);
    /// assert_eq!(Right::from_name("EDIT"), Right::Edit);
    /// assert_eq!(Right::from_name("no-such-right"), Right::Illegal);
    /// ```
    pub fn from_name(name: &str) -> Right {
        for right in Right::ALL {
            if right.name().eq_ignore_ascii_case(name) {
                return right;
            }
        }
        Right::Illegal
    }

    /// Which state wins when two rules at the *same* hierarchy level
    /// disagree about this right.
    ///
    /// # Examples
    ///
    /// ```
    /// use hierights::{Right, RightState};
    ///
    /// assert_eq!(Right::View.tie_break(), RightState::Deny);
    /// assert_eq!(Right::Admin.tie_break(), RightState::Allow);
    /// ```
    pub fn tie_break(self) -> RightState {
        match self {
            Right::View | Right::Edit | Right::Delete | Right::Comment => RightState::Deny,
            Right::Login | Right::Register | Right::Admin | Right::Program => RightState::Allow,
            Right::Illegal => RightState::Deny,
        }
    }

    /// Whether a more specific (deeper) level's determination overrides an
    /// ancestor's. When false, only an ancestor ALLOW can upgrade the
    /// decision: a descendant cannot unilaterally grant the right.
    pub fn smaller_wins(self) -> bool {
        match self {
            Right::View | Right::Edit | Right::Delete | Right::Comment | Right::Login => true,
            Right::Register | Right::Admin | Right::Program | Right::Illegal => false,
        }
    }

    /// The baked-in state used when no rule at any level determined this
    /// right. Sensitive rights default closed.
    pub fn default_state(self) -> RightState {
        match self {
            Right::Login | Right::View | Right::Edit | Right::Comment | Right::Register => {
                RightState::Allow
            }
            Right::Delete | Right::Admin | Right::Program | Right::Illegal => RightState::Deny,
        }
    }

    /// Rights granted along with this one when it resolves to ALLOW.
    pub fn implied_rights(self) -> RightSet {
        match self {
            Right::Admin => RightSet::of(&[
                Right::Login,
                Right::View,
                Right::Edit,
                Right::Delete,
                Right::Register,
                Right::Comment,
            ]),
            Right::Program => RightSet::of(&[
                Right::Login,
                Right::View,
                Right::Edit,
                Right::Delete,
                Right::Register,
                Right::Comment,
                Right::Admin,
            ]),
            _ => RightSet::empty(),
        }
    }

    /// The rights that are even considered at a given hierarchy level.
    /// PROGRAM is enabled only at the main farm root.
    ///
    /// # Examples
    ///
    /// ```
    /// use hierights::{HierarchyLevel, Right};
    ///
    /// assert!(Right::enabled_at(HierarchyLevel::MainFarm).contains(Right::Program));
    /// assert!(!Right::enabled_at(HierarchyLevel::Farm).contains(Right::Program));
    /// assert!(!Right::enabled_at(HierarchyLevel::Document).contains(Right::Admin));
    /// ```
    pub fn enabled_at(level: HierarchyLevel) -> RightSet {
        match level {
            HierarchyLevel::Document => {
                RightSet::of(&[Right::View, Right::Edit, Right::Delete, Right::Comment])
            }
            HierarchyLevel::Space => RightSet::of(&[
                Right::View,
                Right::Edit,
                Right::Delete,
                Right::Comment,
                Right::Admin,
            ]),
            HierarchyLevel::Farm => RightSet::of(&[
                Right::Login,
                Right::Register,
                Right::View,
                Right::Edit,
                Right::Delete,
                Right::Comment,
                Right::Admin,
            ]),
            HierarchyLevel::MainFarm => RightSet::of(&[
                Right::Login,
                Right::Register,
                Right::View,
                Right::Edit,
                Right::Delete,
                Right::Comment,
                Right::Admin,
                Right::Program,
            ]),
        }
    }

    fn from_ordinal(ordinal: usize) -> Right {
        Right::ALL[ordinal]
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A compact set of rights, backed by a bit mask.
///
/// # Examples
///
/// ```
/// use hierights::{Right, RightSet};
///
/// let mut set = RightSet::of(&[Right::View, Right::Edit]);
/// assert!(set.contains(Right::View));
/// assert!(!set.contains(Right::Delete));
/// set.insert(Right::Delete);
/// assert_eq!(set.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RightSet(u16);

impl RightSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(rights: &[Right]) -> Self {
        let mut set = Self::empty();
        for &right in rights {
            set.insert(right);
        }
        set
    }

    pub fn insert(&mut self, right: Right) {
        self.0 |= 1 << right.ordinal();
    }

    pub fn remove(&mut self, right: Right) {
        self.0 &= !(1 << right.ordinal());
    }

    pub fn contains(self, right: Right) -> bool {
        self.0 & (1 << right.ordinal()) != 0
    }

    pub fn union(self, other: RightSet) -> RightSet {
        RightSet(self.0 | other.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the contained rights in ordinal order.
    pub fn iter(self) -> impl Iterator<Item = Right> {
        (0..Right::COUNT)
            .filter(move |&i| self.0 & (1 << i) != 0)
            .map(Right::from_ordinal)
    }
}

impl FromIterator<Right> for RightSet {
    fn from_iter<T: IntoIterator<Item = Right>>(iter: T) -> Self {
        let mut set = Self::empty();
        for right in iter {
            set.insert(right);
        }
        set
    }
}

impl fmt::Display for RightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        write!(f, "[")?;
        for right in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", right)?;
        }
        write!(f, "]")
    }
}

// Serialized as the list of right names, so rule records stay readable.
impl Serialize for RightSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RightSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rights = Vec::<Right>::deserialize(deserializer)?;
        Ok(rights.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Right::View => RightState::Deny ; "view ties closed")]
    #[test_case(Right::Edit => RightState::Deny ; "edit ties closed")]
    #[test_case(Right::Delete => RightState::Deny ; "delete ties closed")]
    #[test_case(Right::Comment => RightState::Deny ; "comment ties closed")]
    #[test_case(Right::Login => RightState::Allow ; "login ties open")]
    #[test_case(Right::Register => RightState::Allow ; "register ties open")]
    #[test_case(Right::Admin => RightState::Allow ; "admin ties open")]
    #[test_case(Right::Program => RightState::Allow ; "program ties open")]
    fn test_tie_break_table(right: Right) -> RightState {
        right.tie_break()
    }

    #[test_case(Right::View => true ; "view inherits downward")]
    #[test_case(Right::Edit => true ; "edit inherits downward")]
    #[test_case(Right::Delete => true ; "delete inherits downward")]
    #[test_case(Right::Comment => true ; "comment inherits downward")]
    #[test_case(Right::Login => true ; "login inherits downward")]
    #[test_case(Right::Register => false ; "register held above")]
    #[test_case(Right::Admin => false ; "admin held above")]
    #[test_case(Right::Program => false ; "program held above")]
    fn test_smaller_wins_table(right: Right) -> bool {
        right.smaller_wins()
    }

    #[test_case(Right::Login => RightState::Allow)]
    #[test_case(Right::View => RightState::Allow)]
    #[test_case(Right::Edit => RightState::Allow)]
    #[test_case(Right::Comment => RightState::Allow)]
    #[test_case(Right::Register => RightState::Allow)]
    #[test_case(Right::Delete => RightState::Deny)]
    #[test_case(Right::Admin => RightState::Deny)]
    #[test_case(Right::Program => RightState::Deny)]
    #[test_case(Right::Illegal => RightState::Deny)]
    fn test_default_state_table(right: Right) -> RightState {
        right.default_state()
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Right::from_name("view"), Right::View);
        assert_eq!(Right::from_name("Program"), Right::Program);
        assert_eq!(Right::from_name("bogus"), Right::Illegal);
    }

    #[test]
    fn test_ordinals_match_all_order() {
        for (i, right) in Right::ALL.iter().enumerate() {
            assert_eq!(right.ordinal(), i);
        }
    }

    #[test]
    fn test_program_enabled_only_at_main_farm() {
        assert!(Right::enabled_at(HierarchyLevel::MainFarm).contains(Right::Program));
        for level in [
            HierarchyLevel::Farm,
            HierarchyLevel::Space,
            HierarchyLevel::Document,
        ] {
            assert!(!Right::enabled_at(level).contains(Right::Program));
        }
    }

    #[test]
    fn test_implied_rights() {
        let admin = Right::Admin.implied_rights();
        assert_eq!(admin.len(), 6);
        assert!(admin.contains(Right::View));
        assert!(!admin.contains(Right::Admin));

        let program = Right::Program.implied_rights();
        assert_eq!(program.len(), 7);
        assert!(program.contains(Right::Admin));

        assert!(Right::View.implied_rights().is_empty());
    }

    #[test]
    fn test_right_set_operations() {
        let mut set = RightSet::of(&[Right::View, Right::Edit]);
        assert_eq!(set.len(), 2);
        set.insert(Right::View);
        assert_eq!(set.len(), 2);
        set.remove(Right::Edit);
        assert!(!set.contains(Right::Edit));

        let collected: Vec<Right> = RightSet::of(&[Right::Edit, Right::Login]).iter().collect();
        assert_eq!(collected, vec![Right::Login, Right::Edit]);
    }

    #[test]
    fn test_right_set_serde_roundtrip() {
        let set = RightSet::of(&[Right::View, Right::Admin]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["view","admin"]"#);
        let back: RightSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_level_of_entity() {
        use crate::types::DocumentRef;

        let main = FarmId::new("main");
        assert_eq!(
            HierarchyLevel::of(&EntityRef::Farm(main.clone()), &main),
            HierarchyLevel::MainFarm
        );
        assert_eq!(
            HierarchyLevel::of(&EntityRef::Farm(FarmId::new("acme")), &main),
            HierarchyLevel::Farm
        );
        let doc = EntityRef::Document(DocumentRef::new(FarmId::new("acme"), "Eng", "Readme"));
        assert_eq!(HierarchyLevel::of(&doc, &main), HierarchyLevel::Document);
    }
}
