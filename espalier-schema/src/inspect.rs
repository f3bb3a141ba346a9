//! Relation inspection: classifying declared fields into relation kinds.
//!
//! Classification is a pure function of static metadata. Given the universe
//! of structured types, every field shape maps to at most one
//! [`RelationKind`]:
//!
//! - a reference to entity `E` is a single-reference targeting `E`
//! - an ordered collection of references to `E` is a reference-collection
//! - a sequence of a structured type that itself contains references is a
//!   nested-collection targeting that type
//! - a structured type containing references, or a union/optional thereof,
//!   is a nested-single targeting the first qualifying member
//! - everything else (scalars, reference-free structures, unions with no
//!   qualifying member) is excluded
//!
//! Optional wrappers are transparent throughout. "Contains references" is
//! transitive through nested structured types and terminates on cyclic type
//! graphs.

use std::collections::HashSet;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::meta::{FieldShape, StructDef};
use crate::relation::{RelInfo, RelationKind};

/// Build the relation classification table for one structured type.
///
/// Returns a map from field name to [`RelInfo`], in declaration order,
/// containing only relation-bearing fields. The registry calls this once per
/// type at build and caches the result.
///
/// # Example
///
/// ```rust
/// use espalier_schema::{FieldShape, RelationKind, StructDef, inspect};
/// use indexmap::IndexMap;
///
/// let article = StructDef::new("Article")
///     .field("title", FieldShape::string())
///     .field("owner", FieldShape::reference("User"));
///
/// let mut structs = IndexMap::new();
/// structs.insert(article.name.clone(), article.clone());
///
/// let table = inspect(&article, &structs);
/// assert_eq!(table.len(), 1);
/// assert_eq!(table["owner"].kind, RelationKind::SingleReference);
/// ```
pub fn inspect(
    def: &StructDef,
    structs: &IndexMap<SmolStr, StructDef>,
) -> IndexMap<SmolStr, RelInfo> {
    let mut table = IndexMap::new();
    for (name, field) in def.iter() {
        if let Some((kind, target)) = classify(&field.shape, structs) {
            table.insert(name.clone(), RelInfo::new(name.clone(), target, kind));
        }
    }
    table
}

/// Classify a single field shape.
///
/// Returns the relation kind and target type name, or `None` for plain
/// fields.
pub fn classify(
    shape: &FieldShape,
    structs: &IndexMap<SmolStr, StructDef>,
) -> Option<(RelationKind, SmolStr)> {
    let mut visited = HashSet::new();
    classify_shape(shape, structs, &mut visited)
}

/// Check whether a structured type (transitively) contains reference fields.
///
/// Reference-free structured types are treated as plain data: nesting into
/// them at runtime would discover nothing.
pub fn contains_references(name: &str, structs: &IndexMap<SmolStr, StructDef>) -> bool {
    let mut visited = HashSet::new();
    struct_contains_references(&SmolStr::new(name), structs, &mut visited)
}

fn classify_shape(
    shape: &FieldShape,
    structs: &IndexMap<SmolStr, StructDef>,
    visited: &mut HashSet<SmolStr>,
) -> Option<(RelationKind, SmolStr)> {
    match shape.unwrap_optional() {
        FieldShape::Reference(entity) => Some((RelationKind::SingleReference, entity.clone())),
        FieldShape::ReferenceList(entity) => {
            Some((RelationKind::ReferenceCollection, entity.clone()))
        }
        FieldShape::StructList(name) => struct_contains_references(name, structs, visited)
            .then(|| (RelationKind::NestedCollection, name.clone())),
        FieldShape::Struct(name) => struct_contains_references(name, structs, visited)
            .then(|| (RelationKind::NestedSingle, name.clone())),
        FieldShape::Union(members) => members.iter().find_map(|member| {
            match member.unwrap_optional() {
                FieldShape::Struct(name)
                    if struct_contains_references(name, structs, visited) =>
                {
                    Some((RelationKind::NestedSingle, name.clone()))
                }
                _ => None,
            }
        }),
        FieldShape::Scalar(_) => None,
        FieldShape::Optional(_) => unreachable!("unwrap_optional strips optional wrappers"),
    }
}

fn struct_contains_references(
    name: &SmolStr,
    structs: &IndexMap<SmolStr, StructDef>,
    visited: &mut HashSet<SmolStr>,
) -> bool {
    // A cycle alone contributes no references; every type reachable from the
    // root is explored exactly once.
    if !visited.insert(name.clone()) {
        return false;
    }
    let Some(def) = structs.get(name) else {
        return false;
    };
    def.fields
        .values()
        .any(|field| classify_shape(&field.shape, structs, visited).is_some())
}
