//! Error types for reference resolution with actionable messages.
//!
//! This module provides detailed error types that include:
//! - Error codes for programmatic handling
//! - Actionable suggestions for fixing issues
//! - Context about what operation failed
//! - Help text and documentation links
//!
//! # Error Codes
//!
//! Error codes follow a pattern: E{category}{number}
//! - 1xxx: Resolution errors (missing key, abstract target, leaked placeholder)
//! - 2xxx: Schema errors (unknown entity/struct, malformed reference)
//! - 3xxx: Store errors (backing fetch failed)
//! - 4xxx: Decode errors (wire payload did not match the declared shape)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use espalier_resolve::ErrorCode;
//!
//! // Error codes have string representations
//! let code = ErrorCode::KeyNotFound;
//! assert_eq!(code.code(), "E1001");
//! ```
//!
//! # Creating Errors
//!
//! ```rust
//! use espalier_resolve::{ErrorCode, ResolveError};
//!
//! // Missing-key error
//! let err = ResolveError::not_found("User", "5");
//! assert_eq!(err.code, ErrorCode::KeyNotFound);
//!
//! // Generic error with code
//! let err = ResolveError::new(ErrorCode::StoreFailed, "connection reset");
//! assert_eq!(err.code, ErrorCode::StoreFailed);
//! ```

use std::fmt;

use thiserror::Error;

/// Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Resolution errors (1xxx)
    /// No record exists for a referenced key (E1001).
    KeyNotFound = 1001,
    /// An abstract entity was referenced by a bare key (E1002).
    AbstractTarget = 1002,
    /// An unresolved placeholder reached a serialization boundary (E1003).
    PendingLeak = 1003,

    // Schema errors (2xxx)
    /// The named entity is not registered (E2001).
    UnknownEntity = 2001,
    /// The named structured type is not registered (E2002).
    UnknownStruct = 2002,
    /// A reference value had an unusable shape (E2003).
    InvalidReference = 2003,
    /// A path string could not be parsed (E2004).
    InvalidPath = 2004,

    // Store errors (3xxx)
    /// The backing store failed to serve a fetch (E3001).
    StoreFailed = 3001,

    // Decode errors (4xxx)
    /// A wire payload did not match the declared field shapes (E4001).
    DecodeFailed = 4001,

    // Configuration errors (7xxx)
    /// Invalid configuration (E7001).
    InvalidConfig = 7001,

    // Internal errors (9xxx)
    /// Internal error (E9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "E1001").
    pub fn code(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "Referenced key not found",
            Self::AbstractTarget => "Abstract entity referenced by bare key",
            Self::PendingLeak => "Unresolved placeholder at serialization boundary",
            Self::UnknownEntity => "Unknown entity",
            Self::UnknownStruct => "Unknown structured type",
            Self::InvalidReference => "Invalid reference value",
            Self::InvalidPath => "Malformed path string",
            Self::StoreFailed => "Backing store fetch failed",
            Self::DecodeFailed => "Payload decoding failed",
            Self::InvalidConfig => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        format!("https://espalier-rs.dev/docs/errors/{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The entity involved.
    pub entity: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The dotted path from the root object to the offending slot.
    pub path: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Create new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operation.
    pub fn operation(mut self, op: impl Into<String>) -> Self {
        self.operation = Some(op.into());
        self
    }

    /// Set the entity.
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the field.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a suggestion.
    pub fn suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Add a text suggestion.
    pub fn suggest(mut self, text: impl Into<String>) -> Self {
        self.suggestions.push(Suggestion::new(text));
        self
    }

    /// Set help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Errors that can occur while collecting, fetching, or substituting
/// references.
#[derive(Error, Debug)]
pub struct ResolveError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl ResolveError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.context.path = Some(path.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(
        mut self,
        text: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a missing-key error.
    pub fn not_found(entity: impl Into<String>, key: impl fmt::Display) -> Self {
        let entity = entity.into();
        Self::new(
            ErrorCode::KeyNotFound,
            format!("No {} record found for key {}", entity, key),
        )
        .with_entity(&entity)
        .with_suggestion(format!("Verify the {} key exists in the backing store", entity))
        .with_suggestion("Flush the shared cache if the record was recently deleted")
    }

    /// Create an abstract-target error.
    pub fn abstract_target(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self::new(
            ErrorCode::AbstractTarget,
            format!("Cannot fetch abstract entity {} from a bare key", entity),
        )
        .with_entity(&entity)
        .with_code_suggestion(
            "Reference abstract entities with a discriminator map naming the concrete entity",
            "{ \"entity\": \"Stock\", \"id\": 5 }",
        )
    }

    /// Create a leaked-placeholder error.
    pub fn pending_leak(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PendingLeak,
            format!("Unresolved reference placeholder at {}", path),
        )
        .with_path(&path)
        .with_suggestion("Run fetch_cache on the object before serializing it")
    }

    /// Create an unknown entity error.
    pub fn unknown_entity(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::UnknownEntity,
            format!("No entity named {} is registered", name),
        )
        .with_entity(&name)
        .with_suggestion(format!("Register {} with the registry builder", name))
    }

    /// Create an unknown structured-type error.
    pub fn unknown_struct(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::UnknownStruct,
            format!("No structured type named {} is registered", name),
        )
        .with_suggestion(format!("Register {} with the registry builder", name))
    }

    /// Create a malformed-path error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidPath,
            format!("Malformed path: {}", message.into()),
        )
        .with_suggestion("Paths are dotted field names with numeric list indices, e.g. children.2.owner")
    }

    /// Create an invalid reference error.
    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidReference,
            format!("Invalid reference value: {}", message.into()),
        )
        .with_suggestion("Reference slots accept a key, a discriminator map, or an inline record")
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::StoreFailed,
            format!("Store fetch failed: {}", message.into()),
        )
        .with_suggestion("Check that the backing store is reachable")
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DecodeFailed,
            format!("Failed to decode payload: {}", message.into()),
        )
        .with_suggestion("Check that the payload matches the declared field shapes")
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfig,
            format!("Invalid configuration: {}", message.into()),
        )
        .with_suggestion("Check ESPALIER_* environment variables and config files")
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Internal,
            format!("Internal error: {}", message.into()),
        )
        .with_help(
            "This is likely a bug in Espalier - please report it at \
             https://github.com/espalier-rs/espalier/issues",
        )
    }

    // ============== Error Checks ==============

    /// Check if this is a missing-key error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::KeyNotFound
    }

    /// Check if this is an abstract-target error.
    pub fn is_abstract_target(&self) -> bool {
        self.code == ErrorCode::AbstractTarget
    }

    /// Check if this is a leaked-placeholder error.
    pub fn is_pending_leak(&self) -> bool {
        self.code == ErrorCode::PendingLeak
    }

    /// Check if this error points at the schema rather than the data.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownEntity
                | ErrorCode::UnknownStruct
                | ErrorCode::InvalidReference
                | ErrorCode::InvalidPath
        )
    }

    /// Check if this error came from the backing store.
    pub fn is_store_error(&self) -> bool {
        self.code == ErrorCode::StoreFailed
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.code == ErrorCode::StoreFailed
    }

    // ============== Display Functions ==============

    /// Get the error code.
    pub fn error_code(&self) -> &ErrorCode {
        &self.code
    }

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        self.code.docs_url()
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  While: {}\n", op));
        }
        if let Some(ref entity) = self.context.entity {
            output.push_str(&format!("  Entity: {}\n", entity));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  Field: {}\n", field));
        }
        if let Some(ref path) = self.context.path {
            output.push_str(&format!("  Path: {}\n", path));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!("     {}\n", code));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output.push_str(&format!("\nMore info: {}\n", self.docs_url()));

        output
    }
}

/// Extension trait for converting errors to ResolveError.
pub trait IntoResolveError {
    /// Convert to a ResolveError.
    fn into_resolve_error(self) -> ResolveError;
}

impl<E: std::error::Error + Send + Sync + 'static> IntoResolveError for E {
    fn into_resolve_error(self) -> ResolveError {
        ResolveError::store(self.to_string()).with_source(self)
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! resolve_error {
    ($code:expr, $msg:expr) => {
        $crate::error::ResolveError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::ResolveError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}
