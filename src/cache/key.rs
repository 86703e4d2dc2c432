//! Canonical cache keys.

use std::fmt;

use crate::types::{EntityRef, Identity};

/// Separator between the identity and entity halves of a decision key.
const KEY_SEPARATOR: &str = "@@";

/// Canonical identity of one cache slot.
///
/// Entity keys and decision keys live in disjoint namespaces: a miss on
/// the cheap entity key can short-circuit the expensive identity-level
/// computation when a level provably has no local rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Rules attached to one entity level.
    Entity(String),

    /// The resolved decision of one identity, anchored at one entity level.
    Access { identity: String, entity: String },
}

impl CacheKey {
    pub fn entity(entity: &EntityRef) -> Self {
        CacheKey::Entity(entity.canonical())
    }

    pub fn access(identity: &Identity, entity: &EntityRef) -> Self {
        CacheKey::Access {
            identity: identity.as_str().to_string(),
            entity: entity.canonical(),
        }
    }

    /// Whether this is a decision key belonging to the given identity.
    pub fn is_access_for(&self, identity: &Identity) -> bool {
        match self {
            CacheKey::Access { identity: id, .. } => id == identity.as_str(),
            CacheKey::Entity(_) => false,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Entity(entity) => write!(f, "{}", entity),
            CacheKey::Access { identity, entity } => {
                write!(f, "{}{}{}", identity, KEY_SEPARATOR, entity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentRef, FarmId};

    #[test]
    fn test_namespaces_are_disjoint() {
        let entity = EntityRef::Farm(FarmId::new("acme"));
        let rule_key = CacheKey::entity(&entity);
        let access_key = CacheKey::access(&Identity::new("acme"), &entity);
        assert_ne!(rule_key, access_key);
    }

    #[test]
    fn test_access_key_display_uses_separator() {
        let doc = EntityRef::Document(DocumentRef::new(FarmId::new("acme"), "Eng", "Readme"));
        let key = CacheKey::access(&Identity::new("alice"), &doc);
        assert_eq!(key.to_string(), "alice@@acme:Eng/Readme");
    }

    #[test]
    fn test_is_access_for() {
        let doc = EntityRef::Farm(FarmId::new("acme"));
        let key = CacheKey::access(&Identity::new("alice"), &doc);
        assert!(key.is_access_for(&Identity::new("alice")));
        assert!(!key.is_access_for(&Identity::new("bob")));
        assert!(!CacheKey::entity(&doc).is_access_for(&Identity::new("alice")));
    }
}
