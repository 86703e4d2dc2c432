//! Core identity and entity reference types.
//!
//! Entities form a three-level hierarchy: a farm (tenant realm) contains
//! spaces, spaces contain documents. A distinguished main farm roots every
//! resolution chain; secondary farms inherit farm-wide rules from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user identity, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A group identity, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A membership subject: either a user or a group (groups can be members of
/// other groups, which is how transitive expansion works).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    User(Identity),
    Group(GroupId),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(id) => write!(f, "{}", id),
            Subject::Group(id) => write!(f, "{}", id),
        }
    }
}

/// A farm (tenant realm) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmId(String);

impl FarmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The type of a node in the entity hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Farm,
    Space,
    Document,
}

/// Reference to a document, the leaf level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub farm: FarmId,
    pub space: String,
    pub name: String,
}

impl DocumentRef {
    /// Name of the document that carries a farm's own rules. Changing it
    /// affects the whole farm subtree.
    pub const FARM_DESCRIPTOR: &'static str = "FarmPreferences";

    /// Name of the document that carries a space's own rules. Changing it
    /// affects the whole space subtree.
    pub const SPACE_DESCRIPTOR: &'static str = "SpacePreferences";

    pub fn new(farm: FarmId, space: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            farm,
            space: space.into(),
            name: name.into(),
        }
    }

    /// The entity this document describes: the farm for a farm descriptor,
    /// the space for a space descriptor, the document itself otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use hierights::{DocumentRef, EntityKind, FarmId};
    ///
    /// let doc = DocumentRef::new(FarmId::new("acme"), "Eng", "SpacePreferences");
    /// assert_eq!(doc.described_entity().kind(), EntityKind::Space);
    ///
    /// let doc = DocumentRef::new(FarmId::new("acme"), "Eng", "Readme");
    /// assert_eq!(doc.described_entity().kind(), EntityKind::Document);
    /// ```
    pub fn described_entity(&self) -> EntityRef {
        if self.name == Self::FARM_DESCRIPTOR {
            EntityRef::Farm(self.farm.clone())
        } else if self.name == Self::SPACE_DESCRIPTOR {
            EntityRef::Space {
                farm: self.farm.clone(),
                space: self.space.clone(),
            }
        } else {
            EntityRef::Document(self.clone())
        }
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::Document(self.clone())
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.farm, self.space, self.name)
    }
}

/// Reference to one node of the entity hierarchy.
///
/// # Examples
///
/// ```
/// use hierights::{DocumentRef, EntityRef, FarmId};
///
/// let doc = EntityRef::Document(DocumentRef::new(FarmId::new("acme"), "Eng", "Readme"));
/// let space = doc.parent().unwrap();
/// let farm = space.parent().unwrap();
/// assert_eq!(farm, EntityRef::Farm(FarmId::new("acme")));
/// assert!(farm.parent().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Farm(FarmId),
    Space { farm: FarmId, space: String },
    Document(DocumentRef),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Farm(_) => EntityKind::Farm,
            EntityRef::Space { .. } => EntityKind::Space,
            EntityRef::Document(_) => EntityKind::Document,
        }
    }

    /// The farm this entity belongs to.
    pub fn farm(&self) -> &FarmId {
        match self {
            EntityRef::Farm(farm) => farm,
            EntityRef::Space { farm, .. } => farm,
            EntityRef::Document(doc) => &doc.farm,
        }
    }

    /// The parent node within the same farm, if any.
    pub fn parent(&self) -> Option<EntityRef> {
        match self {
            EntityRef::Farm(_) => None,
            EntityRef::Space { farm, .. } => Some(EntityRef::Farm(farm.clone())),
            EntityRef::Document(doc) => Some(EntityRef::Space {
                farm: doc.farm.clone(),
                space: doc.space.clone(),
            }),
        }
    }

    /// The full resolution chain for this entity, leaf first.
    ///
    /// The chain walks up to the entity's own farm root; for an entity in a
    /// secondary farm the main farm root is appended, so that farm-wide
    /// rules defined there are considered.
    ///
    /// # Examples
    ///
    /// ```
    /// use hierights::{DocumentRef, EntityRef, FarmId};
    ///
    /// let main = FarmId::new("main");
    /// let doc = EntityRef::Document(DocumentRef::new(FarmId::new("acme"), "Eng", "Readme"));
    /// let chain = doc.resolution_chain(&main);
    /// assert_eq!(chain.len(), 4);
    /// assert_eq!(*chain.last().unwrap(), EntityRef::Farm(main));
    /// ```
    pub fn resolution_chain(&self, main_farm: &FarmId) -> Vec<EntityRef> {
        let mut chain = Vec::with_capacity(4);
        let mut current = Some(self.clone());
        while let Some(entity) = current {
            current = entity.parent();
            chain.push(entity);
        }
        if self.farm() != main_farm {
            chain.push(EntityRef::Farm(main_farm.clone()));
        }
        chain
    }

    /// Canonical string form, unique across the hierarchy.
    pub fn canonical(&self) -> String {
        match self {
            EntityRef::Farm(farm) => farm.as_str().to_string(),
            EntityRef::Space { farm, space } => format!("{}:{}", farm, space),
            EntityRef::Document(doc) => format!("{}", doc),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Kind of document change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentEventKind {
    Saved,
    Updated,
    Deleted,
}

/// A document change notification consumed by the invalidator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEvent {
    pub kind: DocumentEventKind,
    pub document: DocumentRef,
}

/// A pagination window for the external group directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// The window following this one.
    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}
