//! # espalier-schema
//!
//! Entity and structured-type metadata for the Espalier resolution engine.
//!
//! This crate provides:
//! - Definition types for entities (fetchable records with a key field) and
//!   structured types (nested field layouts)
//! - Relation classification: which fields hold references, collections of
//!   references, or nested reference-bearing structures
//! - A validated [`Registry`] with precomputed relation tables
//!
//! ## Example
//!
//! ```rust,ignore
//! use espalier_schema::{EntityDef, FieldShape, Registry, StructDef};
//!
//! let registry = Registry::builder()
//!     .entity(EntityDef::new("User", "id"))
//!     .structure(
//!         StructDef::new("Article")
//!             .field("title", FieldShape::string())
//!             .field("owner", FieldShape::reference("User")),
//!     )
//!     .build()?;
//!
//! let rel = registry.relation("Article", "owner").unwrap();
//! assert_eq!(rel.target, "User");
//! ```

pub mod error;
pub mod inspect;
pub mod meta;
pub mod registry;
pub mod relation;

pub use error::{SchemaError, SchemaResult};
pub use inspect::{classify, contains_references, inspect};
pub use meta::{EntityDef, FieldDef, FieldShape, ScalarKind, StructDef};
pub use registry::{Registry, RegistryBuilder, RelationTable};
pub use relation::{RelInfo, RelationKind};
