//! The registry: a validated universe of entity and structured-type
//! definitions with precomputed relation tables.
//!
//! A [`Registry`] is built once, validated as a whole, and then shared
//! read-only. Validation collects every problem before failing so a
//! misconfigured schema surfaces all its issues in one pass.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::{SchemaError, SchemaResult};
use crate::inspect;
use crate::meta::{EntityDef, FieldShape, StructDef};
use crate::relation::RelInfo;

/// Relation classification table for one structured type, keyed by field
/// name in declaration order.
pub type RelationTable = IndexMap<SmolStr, RelInfo>;

// ============================================================================
// Registry
// ============================================================================

/// Validated, immutable collection of entity and structured-type
/// definitions.
///
/// Relation tables are computed at build and shared via [`Arc`] so lookups
/// on the hot path never re-run classification.
///
/// # Example
///
/// ```rust
/// use espalier_schema::{EntityDef, FieldShape, Registry, StructDef};
///
/// let registry = Registry::builder()
///     .entity(EntityDef::new("User", "id"))
///     .structure(
///         StructDef::new("Article")
///             .field("title", FieldShape::string())
///             .field("owner", FieldShape::reference("User")),
///     )
///     .build()
///     .unwrap();
///
/// let table = registry.relations("Article").unwrap();
/// assert_eq!(table.len(), 1);
/// assert!(table.contains_key("owner"));
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    entities: IndexMap<SmolStr, EntityDef>,
    structs: IndexMap<SmolStr, StructDef>,
    relations: IndexMap<SmolStr, Arc<RelationTable>>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up an entity definition by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Look up a structured-type definition by name.
    pub fn structure(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    /// The precomputed relation table for a structured type.
    pub fn relations(&self, name: &str) -> Option<Arc<RelationTable>> {
        self.relations.get(name).cloned()
    }

    /// Look up a single relation entry.
    pub fn relation(&self, structure: &str, field: &str) -> Option<&RelInfo> {
        self.relations.get(structure)?.get(field)
    }

    /// Whether an entity with this name is registered.
    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Whether a structured type with this name is registered.
    pub fn has_structure(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    /// Iterate over registered entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.values()
    }

    /// Iterate over registered structured types in registration order.
    pub fn structures(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.values()
    }

    /// Number of registered entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of registered structured types.
    pub fn structure_count(&self) -> usize {
        self.structs.len()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Registry`].
///
/// Definitions are accepted in any order; targets are resolved at
/// [`build`](RegistryBuilder::build), so forward references between types
/// work naturally.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entities: Vec<EntityDef>,
    structs: Vec<StructDef>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity definition.
    pub fn entity(mut self, def: EntityDef) -> Self {
        self.entities.push(def);
        self
    }

    /// Register several entity definitions.
    pub fn entities(mut self, defs: impl IntoIterator<Item = EntityDef>) -> Self {
        self.entities.extend(defs);
        self
    }

    /// Register a structured-type definition.
    pub fn structure(mut self, def: StructDef) -> Self {
        self.structs.push(def);
        self
    }

    /// Register several structured-type definitions.
    pub fn structures(mut self, defs: impl IntoIterator<Item = StructDef>) -> Self {
        self.structs.extend(defs);
        self
    }

    /// Validate all definitions and produce a [`Registry`].
    ///
    /// Every problem found is reported; multiple issues are wrapped in
    /// [`SchemaError::ValidationFailed`].
    pub fn build(self) -> SchemaResult<Registry> {
        let mut errors = Vec::new();

        let mut entities: IndexMap<SmolStr, EntityDef> = IndexMap::new();
        for def in self.entities {
            if entities.contains_key(&def.name) {
                errors.push(SchemaError::duplicate("entity", def.name.as_str()));
                continue;
            }
            entities.insert(def.name.clone(), def);
        }

        let mut structs: IndexMap<SmolStr, StructDef> = IndexMap::new();
        for def in self.structs {
            if structs.contains_key(&def.name) {
                errors.push(SchemaError::duplicate("struct", def.name.as_str()));
                continue;
            }
            if entities.contains_key(&def.name) {
                errors.push(SchemaError::duplicate("type name", def.name.as_str()));
                continue;
            }
            structs.insert(def.name.clone(), def);
        }

        for def in entities.values() {
            if def.name.is_empty() {
                errors.push(SchemaError::invalid_entity(
                    def.name.as_str(),
                    "name must not be empty",
                ));
            }
            if def.key_field.is_empty() {
                errors.push(SchemaError::missing_key_field(def.name.as_str()));
            }
        }

        for def in structs.values() {
            for field in def.duplicate_fields() {
                errors.push(SchemaError::invalid_field(
                    def.name.as_str(),
                    field.as_str(),
                    "declared more than once",
                ));
            }
            for (name, field) in def.iter() {
                check_targets(&def.name, name, &field.shape, &entities, &structs, &mut errors);
            }
        }

        if !errors.is_empty() {
            return Err(SchemaError::from_errors(errors));
        }

        let relations = structs
            .iter()
            .map(|(name, def)| (name.clone(), Arc::new(inspect::inspect(def, &structs))))
            .collect::<IndexMap<_, _>>();

        tracing::debug!(
            entities = entities.len(),
            structures = structs.len(),
            relations = relations.values().map(|t| t.len()).sum::<usize>(),
            "registry built"
        );

        Ok(Registry {
            entities,
            structs,
            relations,
        })
    }
}

/// Verify that every target named by a shape is registered.
fn check_targets(
    structure: &SmolStr,
    field: &SmolStr,
    shape: &FieldShape,
    entities: &IndexMap<SmolStr, EntityDef>,
    structs: &IndexMap<SmolStr, StructDef>,
    errors: &mut Vec<SchemaError>,
) {
    match shape {
        FieldShape::Scalar(_) => {}
        FieldShape::Reference(entity) | FieldShape::ReferenceList(entity) => {
            if !entities.contains_key(entity) {
                errors.push(SchemaError::unknown_entity(
                    structure.as_str(),
                    field.as_str(),
                    entity.as_str(),
                ));
            }
        }
        FieldShape::Struct(name) | FieldShape::StructList(name) => {
            if !structs.contains_key(name) {
                errors.push(SchemaError::unknown_struct(
                    structure.as_str(),
                    field.as_str(),
                    name.as_str(),
                ));
            }
        }
        FieldShape::Optional(inner) => {
            check_targets(structure, field, inner, entities, structs, errors);
        }
        FieldShape::Union(members) => {
            if members.is_empty() {
                errors.push(SchemaError::invalid_field(
                    structure.as_str(),
                    field.as_str(),
                    "empty union",
                ));
            }
            for member in members {
                check_targets(structure, field, member, entities, structs, errors);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationKind;
    use pretty_assertions::assert_eq;

    fn sample_registry() -> Registry {
        Registry::builder()
            .entity(EntityDef::new("User", "id"))
            .entity(EntityDef::new("Item", "id"))
            .entity(EntityDef::new("Country", "code"))
            .structure(
                StructDef::new("Address")
                    .field("street", FieldShape::string())
                    .field("country", FieldShape::reference("Country")),
            )
            .structure(
                StructDef::new("Article")
                    .field("title", FieldShape::string())
                    .field("owner", FieldShape::reference("User"))
                    .field("items", FieldShape::reference_list("Item"))
                    .field("address", FieldShape::structure("Address")),
            )
            .build()
            .unwrap()
    }

    // ==================== Builder Tests ====================

    #[test]
    fn test_build_empty() {
        let registry = Registry::builder().build().unwrap();
        assert_eq!(registry.entity_count(), 0);
        assert_eq!(registry.structure_count(), 0);
    }

    #[test]
    fn test_build_and_lookup() {
        let registry = sample_registry();

        assert_eq!(registry.entity_count(), 3);
        assert_eq!(registry.structure_count(), 2);
        assert!(registry.has_entity("User"));
        assert!(!registry.has_entity("Ghost"));
        assert!(registry.has_structure("Article"));

        let user = registry.entity("User").unwrap();
        assert_eq!(user.key_field, "id");

        let article = registry.structure("Article").unwrap();
        assert_eq!(article.len(), 4);
    }

    #[test]
    fn test_build_precomputes_relations() {
        let registry = sample_registry();

        let table = registry.relations("Article").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table["owner"].kind, RelationKind::SingleReference);
        assert_eq!(table["items"].kind, RelationKind::ReferenceCollection);
        assert_eq!(table["address"].kind, RelationKind::NestedSingle);

        let table = registry.relations("Address").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["country"].target, "Country");
    }

    #[test]
    fn test_relation_lookup() {
        let registry = sample_registry();

        let rel = registry.relation("Article", "owner").unwrap();
        assert_eq!(rel.target, "User");
        assert!(registry.relation("Article", "title").is_none());
        assert!(registry.relation("Ghost", "owner").is_none());
    }

    #[test]
    fn test_forward_references_allowed() {
        // Article registered before its targets exist in the builder.
        let registry = Registry::builder()
            .structure(StructDef::new("Article").field("owner", FieldShape::reference("User")))
            .entity(EntityDef::new("User", "id"))
            .build()
            .unwrap();

        assert_eq!(registry.relations("Article").unwrap().len(), 1);
    }

    #[test]
    fn test_iteration_order() {
        let registry = sample_registry();
        let names: Vec<&str> = registry.entities().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Item", "Country"]);

        let names: Vec<&str> = registry.structures().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Address", "Article"]);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_duplicate_entity_rejected() {
        let err = Registry::builder()
            .entity(EntityDef::new("User", "id"))
            .entity(EntityDef::new("User", "pk"))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::Duplicate { .. }));
        assert!(format!("{err}").contains("User"));
    }

    #[test]
    fn test_duplicate_struct_rejected() {
        let err = Registry::builder()
            .structure(StructDef::new("Address"))
            .structure(StructDef::new("Address"))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::Duplicate { .. }));
    }

    #[test]
    fn test_entity_struct_name_collision_rejected() {
        let err = Registry::builder()
            .entity(EntityDef::new("User", "id"))
            .structure(StructDef::new("User"))
            .build()
            .unwrap_err();

        match err {
            SchemaError::Duplicate { kind, name } => {
                assert_eq!(kind, "type name");
                assert_eq!(name, "User");
            }
            other => panic!("Expected Duplicate, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_reference_target_rejected() {
        let err = Registry::builder()
            .structure(StructDef::new("Article").field("owner", FieldShape::reference("Ghost")))
            .build()
            .unwrap_err();

        match err {
            SchemaError::UnknownTarget { target, kind, .. } => {
                assert_eq!(target, "Ghost");
                assert_eq!(kind, "entity");
            }
            other => panic!("Expected UnknownTarget, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_struct_target_rejected() {
        let err = Registry::builder()
            .structure(StructDef::new("Article").field("address", FieldShape::structure("Ghost")))
            .build()
            .unwrap_err();

        match err {
            SchemaError::UnknownTarget { kind, .. } => assert_eq!(kind, "struct"),
            other => panic!("Expected UnknownTarget, got {other:?}"),
        }
    }

    #[test]
    fn test_union_member_targets_checked() {
        let err = Registry::builder()
            .structure(StructDef::new("Article").field(
                "extra",
                FieldShape::union([FieldShape::string(), FieldShape::structure("Ghost")]),
            ))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::UnknownTarget { .. }));
    }

    #[test]
    fn test_optional_target_checked() {
        let err = Registry::builder()
            .structure(
                StructDef::new("Article")
                    .field("owner", FieldShape::reference("Ghost").optional()),
            )
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::UnknownTarget { .. }));
    }

    #[test]
    fn test_empty_union_rejected() {
        let err = Registry::builder()
            .structure(StructDef::new("Article").field("extra", FieldShape::union([])))
            .build()
            .unwrap_err();

        match err {
            SchemaError::InvalidField { message, .. } => assert_eq!(message, "empty union"),
            other => panic!("Expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_field_rejected() {
        let err = Registry::builder()
            .entity(EntityDef::new("User", ""))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::MissingKeyField { .. }));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Registry::builder()
            .structure(
                StructDef::new("Article")
                    .field("title", FieldShape::string())
                    .field("title", FieldShape::int()),
            )
            .build()
            .unwrap_err();

        match err {
            SchemaError::InvalidField { field, message, .. } => {
                assert_eq!(field, "title");
                assert!(message.contains("more than once"));
            }
            other => panic!("Expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_errors_collected() {
        let err = Registry::builder()
            .entity(EntityDef::new("User", ""))
            .structure(StructDef::new("Article").field("owner", FieldShape::reference("Ghost")))
            .structure(StructDef::new("Article"))
            .build()
            .unwrap_err();

        match err {
            SchemaError::ValidationFailed { count, errors } => {
                assert_eq!(count, 3);
                assert_eq!(errors.len(), 3);
            }
            other => panic!("Expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_abstract_entity_as_target() {
        let registry = Registry::builder()
            .entity(EntityDef::abstract_entity("Asset", "id"))
            .structure(StructDef::new("Portfolio").field("assets", FieldShape::reference_list("Asset")))
            .build()
            .unwrap();

        assert!(registry.entity("Asset").unwrap().is_abstract);
        assert_eq!(
            registry.relation("Portfolio", "assets").unwrap().kind,
            RelationKind::ReferenceCollection,
        );
    }
}
