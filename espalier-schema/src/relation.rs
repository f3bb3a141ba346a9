//! Relation classification records.
//!
//! The relation inspector reduces every declared field to one of four
//! relation kinds (or excludes it). The resulting [`RelInfo`] table is the
//! only metadata the runtime collector needs, so it is computed once per
//! structured type at registry build and shared immutably afterwards.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// How a field relates to external entities or nested structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// A single reference to an entity (holds one key).
    SingleReference,
    /// An ordered collection of references to one entity type.
    ReferenceCollection,
    /// An embedded structured sub-object that itself contains references.
    NestedSingle,
    /// An ordered sequence of embedded sub-objects containing references.
    NestedCollection,
}

impl RelationKind {
    /// Check if this kind holds entity keys directly.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::SingleReference | Self::ReferenceCollection)
    }

    /// Check if this kind recurses into nested structured data.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::NestedSingle | Self::NestedCollection)
    }

    /// Check if this kind addresses an ordered sequence of values.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::ReferenceCollection | Self::NestedCollection)
    }

    /// Get a short name for diagnostics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleReference => "single-reference",
            Self::ReferenceCollection => "reference-collection",
            Self::NestedSingle => "nested-single",
            Self::NestedCollection => "nested-collection",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification record for one relation-bearing field.
///
/// For reference kinds the target names an entity type; for nested kinds it
/// names a structured type. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelInfo {
    /// The originating field name.
    pub field: SmolStr,
    /// Target entity type (reference kinds) or structured type (nested kinds).
    pub target: SmolStr,
    /// The relation kind.
    pub kind: RelationKind,
}

impl RelInfo {
    /// Create a new classification record.
    pub fn new(
        field: impl Into<SmolStr>,
        target: impl Into<SmolStr>,
        kind: RelationKind,
    ) -> Self {
        Self {
            field: field.into(),
            target: target.into(),
            kind,
        }
    }

    /// Get the field name as a string.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the target type name as a string.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl std::fmt::Display for RelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.kind, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_reference() {
        assert!(RelationKind::SingleReference.is_reference());
        assert!(RelationKind::ReferenceCollection.is_reference());
        assert!(!RelationKind::NestedSingle.is_reference());
        assert!(!RelationKind::NestedCollection.is_reference());
    }

    #[test]
    fn test_kind_is_nested() {
        assert!(RelationKind::NestedSingle.is_nested());
        assert!(RelationKind::NestedCollection.is_nested());
        assert!(!RelationKind::SingleReference.is_nested());
        assert!(!RelationKind::ReferenceCollection.is_nested());
    }

    #[test]
    fn test_kind_is_collection() {
        assert!(RelationKind::ReferenceCollection.is_collection());
        assert!(RelationKind::NestedCollection.is_collection());
        assert!(!RelationKind::SingleReference.is_collection());
        assert!(!RelationKind::NestedSingle.is_collection());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(
            format!("{}", RelationKind::SingleReference),
            "single-reference"
        );
        assert_eq!(
            format!("{}", RelationKind::NestedCollection),
            "nested-collection"
        );
    }

    #[test]
    fn test_rel_info_new() {
        let info = RelInfo::new("owner", "User", RelationKind::SingleReference);
        assert_eq!(info.field(), "owner");
        assert_eq!(info.target(), "User");
        assert_eq!(info.kind, RelationKind::SingleReference);
    }

    #[test]
    fn test_rel_info_display() {
        let info = RelInfo::new("items", "Item", RelationKind::ReferenceCollection);
        assert_eq!(format!("{}", info), "items: reference-collection -> Item");
    }
}
