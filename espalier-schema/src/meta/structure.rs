//! Structured type definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{FieldDef, FieldShape};

/// Descriptor for a structured type: an ordered set of declared fields.
///
/// Structured types are the shapes raw data validates into. Field order is
/// preserved so that collection, substitution, and diagnostics are
/// deterministic.
///
/// # Example
///
/// ```rust
/// use espalier_schema::{FieldShape, StructDef};
///
/// let article = StructDef::new("Article")
///     .field("title", FieldShape::string())
///     .field("owner", FieldShape::reference("User"));
///
/// assert_eq!(article.len(), 2);
/// assert!(article.get("owner").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    /// Structured type name, unique within a registry.
    pub name: SmolStr,
    /// Declared fields in declaration order.
    pub fields: IndexMap<SmolStr, FieldDef>,
    /// Documentation comment.
    pub doc: Option<String>,
    // Duplicate field names are remembered here and surfaced as errors at
    // registry build, so the builder API stays infallible.
    #[serde(skip)]
    duplicate_fields: Vec<SmolStr>,
}

impl StructDef {
    /// Create a new structured type with no fields.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            doc: None,
            duplicate_fields: Vec::new(),
        }
    }

    /// Declare a field with the given shape.
    pub fn field(self, name: impl Into<SmolStr>, shape: FieldShape) -> Self {
        self.with_field(FieldDef::new(name, shape))
    }

    /// Declare a field from a full definition.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        if self.fields.contains_key(&field.name) {
            self.duplicate_fields.push(field.name.clone());
        }
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Attach a documentation comment.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Get the structured type name as a string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over declared fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &FieldDef)> {
        self.fields.iter()
    }

    /// Field names that were declared more than once.
    pub fn duplicate_fields(&self) -> &[SmolStr] {
        &self.duplicate_fields
    }
}

impl std::fmt::Display for StructDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "struct {} {{", self.name)?;
        for field in self.fields.values() {
            writeln!(f, "    {}", field)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> StructDef {
        StructDef::new("Article")
            .field("title", FieldShape::string())
            .field("owner", FieldShape::reference("User"))
            .field("items", FieldShape::reference_list("Item"))
    }

    #[test]
    fn test_struct_new() {
        let def = StructDef::new("Article");
        assert_eq!(def.name(), "Article");
        assert!(def.is_empty());
    }

    #[test]
    fn test_struct_fields_ordered() {
        let def = article();
        let names: Vec<&str> = def.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["title", "owner", "items"]);
    }

    #[test]
    fn test_struct_get() {
        let def = article();
        assert!(def.get("owner").is_some());
        assert!(def.get("missing").is_none());
    }

    #[test]
    fn test_struct_len() {
        assert_eq!(article().len(), 3);
    }

    #[test]
    fn test_struct_duplicate_field_recorded() {
        let def = StructDef::new("Article")
            .field("title", FieldShape::string())
            .field("title", FieldShape::int());

        assert_eq!(def.duplicate_fields(), &["title"]);
        // Last declaration wins in the map itself.
        assert_eq!(def.get("title").unwrap().shape, FieldShape::int());
    }

    #[test]
    fn test_struct_with_doc() {
        let def = StructDef::new("Article").with_doc("A published article");
        assert_eq!(def.doc.as_deref(), Some("A published article"));
    }

    #[test]
    fn test_struct_display() {
        let def = StructDef::new("Point")
            .field("x", FieldShape::int())
            .field("y", FieldShape::int());
        let display = format!("{}", def);
        assert!(display.starts_with("struct Point {"));
        assert!(display.contains("x Int"));
        assert!(display.contains("y Int"));
        assert!(display.ends_with('}'));
    }
}
