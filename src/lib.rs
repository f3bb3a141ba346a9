//! # Espalier
//!
//! Batched entity-reference resolution for nested structured data.
//!
//! Espalier provides:
//! - A schema registry describing entities, structured types, and how their
//!   fields relate
//! - A relation inspector that classifies fields once at registry build
//! - A two-phase resolution engine that discovers references, fetches each
//!   entity type in one batch, and substitutes lazy placeholders
//! - Typed reference slots that collapse placeholders to records inside
//!   decoded host objects
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use espalier::prelude::*;
//!
//! let registry = Arc::new(
//!     Registry::builder()
//!         .entity(EntityDef::new("User", "id"))
//!         .structure(
//!             StructDef::new("Order")
//!                 .field("buyer", FieldShape::reference("User"))
//!                 .field("items", FieldShape::reference_list("Item")),
//!         )
//!         .build()?,
//! );
//!
//! let store: Arc<dyn EntityStore> = Arc::new(my_store());
//! let engine = ResolveEngine::new(registry, store);
//!
//! // One store round trip per entity type, however many references appear.
//! let mut payload: Value = serde_json::json!([
//!     { "buyer": 1, "items": [10, 11] },
//!     { "buyer": 2, "items": [10] },
//! ])
//! .into();
//! engine.build_cache("Order", &mut payload).await?;
//!
//! let mut orders = decode_orders(payload)?;
//! engine.fetch_cache(&mut orders).await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema metadata: entities, structured types, and relation classification.
pub mod schema {
    pub use espalier_schema::*;
}

/// The resolution pipeline: collector, cache, placeholders, slots, engine.
pub mod resolve {
    pub use espalier_resolve::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::resolve::prelude::*;
    pub use crate::schema::{RelInfo, RelationKind};
}

// Re-export key types at the crate root
pub use resolve::{ResolveEngine, ResolveError, ResolveResult, Value};
pub use schema::{Registry, SchemaError};
