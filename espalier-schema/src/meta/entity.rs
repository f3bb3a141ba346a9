//! Entity type descriptors.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Descriptor for a persistence-layer entity type.
///
/// An entity is a record type addressed by a primary key. Espalier never
/// owns entity storage; this descriptor carries just enough metadata to
/// extract keys from wire values and to group batched fetches.
///
/// # Example
///
/// ```rust
/// use espalier_schema::EntityDef;
///
/// let user = EntityDef::new("User", "id");
/// assert_eq!(user.name(), "User");
/// assert_eq!(user.key_field(), "id");
/// assert!(!user.is_abstract());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity type name, unique within a registry.
    pub name: SmolStr,
    /// Name of the attribute holding the primary key on the wire.
    pub key_field: SmolStr,
    /// Abstract entities cannot be fetched from a bare key; values must
    /// carry a type discriminator naming a concrete entity.
    pub is_abstract: bool,
    /// Documentation comment.
    pub doc: Option<String>,
}

impl EntityDef {
    /// Create a new concrete entity descriptor.
    pub fn new(name: impl Into<SmolStr>, key_field: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            key_field: key_field.into(),
            is_abstract: false,
            doc: None,
        }
    }

    /// Create an abstract entity descriptor.
    ///
    /// Concrete entities resolving an abstract target are selected per value
    /// through the wire discriminator attribute.
    pub fn abstract_entity(name: impl Into<SmolStr>, key_field: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            key_field: key_field.into(),
            is_abstract: true,
            doc: None,
        }
    }

    /// Attach a documentation comment.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Get the entity name as a string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the primary-key attribute name.
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Check whether this entity is abstract.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }
}

impl std::fmt::Display for EntityDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_abstract {
            write!(f, "abstract entity {} (key {})", self.name, self.key_field)
        } else {
            write!(f, "entity {} (key {})", self.name, self.key_field)
        }
    }
}
