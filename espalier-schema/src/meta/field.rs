//! Field definitions and declared shapes.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Scalar shapes carried through without inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Boolean value.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// UTF-8 string.
    String,
    /// Arbitrary JSON subtree, never inspected for references.
    Json,
}

impl ScalarKind {
    /// Get the shape name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Json => "Json",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The declared shape of a field.
///
/// Shapes are static metadata: classification into relation kinds happens
/// once per structured type at registry build, never per instance.
///
/// # Example
///
/// ```rust
/// use espalier_schema::FieldShape;
///
/// let owner = FieldShape::reference("User");
/// assert!(owner.is_reference());
///
/// let tags = FieldShape::string().optional();
/// assert!(tags.is_optional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldShape {
    /// A plain scalar value.
    Scalar(ScalarKind),
    /// A single reference to an entity type.
    Reference(SmolStr),
    /// An ordered collection of references to one entity type.
    ReferenceList(SmolStr),
    /// An embedded structured sub-object.
    Struct(SmolStr),
    /// An ordered sequence of embedded structured sub-objects.
    StructList(SmolStr),
    /// An optional wrapper around another shape.
    Optional(Box<FieldShape>),
    /// A union of alternative shapes.
    Union(Vec<FieldShape>),
}

impl FieldShape {
    /// A boolean scalar shape.
    pub fn boolean() -> Self {
        Self::Scalar(ScalarKind::Bool)
    }

    /// An integer scalar shape.
    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    /// A float scalar shape.
    pub fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    /// A string scalar shape.
    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    /// An uninspected JSON scalar shape.
    pub fn json() -> Self {
        Self::Scalar(ScalarKind::Json)
    }

    /// A single reference to the named entity type.
    pub fn reference(entity: impl Into<SmolStr>) -> Self {
        Self::Reference(entity.into())
    }

    /// An ordered collection of references to the named entity type.
    pub fn reference_list(entity: impl Into<SmolStr>) -> Self {
        Self::ReferenceList(entity.into())
    }

    /// An embedded sub-object of the named structured type.
    pub fn structure(name: impl Into<SmolStr>) -> Self {
        Self::Struct(name.into())
    }

    /// An ordered sequence of sub-objects of the named structured type.
    pub fn structure_list(name: impl Into<SmolStr>) -> Self {
        Self::StructList(name.into())
    }

    /// A union of the given alternatives.
    pub fn union(members: impl IntoIterator<Item = FieldShape>) -> Self {
        Self::Union(members.into_iter().collect())
    }

    /// Wrap this shape in an optional.
    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    /// Strip optional wrappers down to the inner shape.
    ///
    /// Optional wrappers are transparent for relation classification.
    pub fn unwrap_optional(&self) -> &FieldShape {
        let mut shape = self;
        while let FieldShape::Optional(inner) = shape {
            shape = inner;
        }
        shape
    }

    /// Check whether the shape is optional at the top level.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Check whether the shape (through optionals) is a single reference.
    pub fn is_reference(&self) -> bool {
        matches!(self.unwrap_optional(), Self::Reference(_))
    }

    /// Check whether the shape (through optionals) is a reference collection.
    pub fn is_reference_list(&self) -> bool {
        matches!(self.unwrap_optional(), Self::ReferenceList(_))
    }

    /// Check whether the shape (through optionals) is scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self.unwrap_optional(), Self::Scalar(_))
    }
}

impl std::fmt::Display for FieldShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind),
            Self::Reference(entity) => write!(f, "ref {}", entity),
            Self::ReferenceList(entity) => write!(f, "ref {}[]", entity),
            Self::Struct(name) => write!(f, "{}", name),
            Self::StructList(name) => write!(f, "{}[]", name),
            Self::Optional(inner) => write!(f, "{}?", inner),
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

/// A declared field of a structured type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: SmolStr,
    /// Declared shape.
    pub shape: FieldShape,
    /// Documentation comment.
    pub doc: Option<String>,
}

impl FieldDef {
    /// Create a new field definition.
    pub fn new(name: impl Into<SmolStr>, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            shape,
            doc: None,
        }
    }

    /// Attach a documentation comment.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Get the field name as a string.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for FieldDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.shape)
    }
}
