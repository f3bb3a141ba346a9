//! Error types for registry construction and validation.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while building or validating a registry.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(espalier::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// A field names a target that was never declared.
    #[error("unknown {kind} `{target}` referenced by `{structure}.{field}`")]
    #[diagnostic(code(espalier::schema::unknown_target))]
    UnknownTarget {
        structure: String,
        field: String,
        target: String,
        kind: String,
    },

    /// Invalid entity definition.
    #[error("invalid entity `{name}`: {message}")]
    #[diagnostic(code(espalier::schema::invalid_entity))]
    InvalidEntity { name: String, message: String },

    /// Invalid field definition.
    #[error("invalid field `{structure}.{field}`: {message}")]
    #[diagnostic(code(espalier::schema::invalid_field))]
    InvalidField {
        structure: String,
        field: String,
        message: String,
    },

    /// Entity declared without a primary-key field name.
    #[error("entity `{entity}` is missing a key field")]
    #[diagnostic(code(espalier::schema::missing_key_field))]
    MissingKeyField { entity: String },

    /// Validation error with multiple issues.
    #[error("registry validation failed with {count} error(s)")]
    #[diagnostic(code(espalier::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an unknown entity target error.
    pub fn unknown_entity(
        structure: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::UnknownTarget {
            structure: structure.into(),
            field: field.into(),
            target: target.into(),
            kind: "entity".to_string(),
        }
    }

    /// Create an unknown structured-type target error.
    pub fn unknown_struct(
        structure: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::UnknownTarget {
            structure: structure.into(),
            field: field.into(),
            target: target.into(),
            kind: "struct".to_string(),
        }
    }

    /// Create an invalid entity error.
    pub fn invalid_entity(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        structure: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            structure: structure.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing key field error.
    pub fn missing_key_field(entity: impl Into<String>) -> Self {
        Self::MissingKeyField {
            entity: entity.into(),
        }
    }

    /// Wrap a list of errors, collapsing a single error to itself.
    pub fn from_errors(mut errors: Vec<SchemaError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::ValidationFailed {
                count: errors.len(),
                errors,
            }
        }
    }
}
