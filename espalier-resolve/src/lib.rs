//! # espalier-resolve
//!
//! Batched entity-reference resolution for validated payloads.
//!
//! This crate turns payloads full of entity keys into payloads full of
//! records without the one-query-per-reference trap. It provides:
//! - A recursive collector that discovers every reference in a payload,
//!   grouped by entity type and tagged with its dotted path
//! - A batch cache filled with one store round trip per entity type
//! - Lazy placeholders substituted into the payload, collapsing to records
//!   on demand with order and duplicates preserved
//! - Typed reference slots ([`Ref`], [`RefList`]) and a resolution walk
//!   ([`Resolvable`]) for decoded host objects
//! - A two-phase engine ([`ResolveEngine`]) tying it all together
//!
//! ## Pipeline
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use espalier_resolve::{MemoryStore, ResolveEngine, Value};
//! use espalier_schema::{EntityDef, FieldShape, Registry, StructDef};
//!
//! let registry = Arc::new(
//!     Registry::builder()
//!         .entity(EntityDef::new("User", "id"))
//!         .structure(StructDef::new("Order").field("buyer", FieldShape::reference("User")))
//!         .build()?,
//! );
//! let store = Arc::new(MemoryStore::new());
//! let engine = ResolveEngine::new(registry, store);
//!
//! // Phase one: discover, batch-fetch, substitute placeholders.
//! let mut payload: Value = serde_json::json!({ "buyer": 1 }).into();
//! engine.build_cache("Order", &mut payload).await?;
//!
//! // Phase two: decode into a host type, then collapse its slots.
//! let mut order = decode(payload)?;
//! engine.fetch_cache(&mut order).await?;
//! ```
//!
//! ## Keys and Records
//!
//! ```rust
//! use espalier_resolve::{Key, Record};
//!
//! let key: Key = 42.into();
//! assert!(key.is_int());
//!
//! let record = Record::new("User", key).with_field("name", "ada");
//! assert_eq!(record.to_string(), "User(42)");
//! ```
//!
//! ## Paths
//!
//! Dotted paths locate reference sites inside nested payloads:
//!
//! ```rust
//! use espalier_resolve::Path;
//!
//! let path: Path = "orders.2.buyer".parse().unwrap();
//! assert_eq!(path.len(), 3);
//! assert_eq!(path.to_string(), "orders.2.buyer");
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use espalier_resolve::{ErrorCode, ResolveError};
//!
//! let err = ResolveError::not_found("User", 5);
//! assert_eq!(err.code, ErrorCode::KeyNotFound);
//! assert!(err.to_string().starts_with("[E1001]"));
//! ```
//!
//! ## Options
//!
//! ```rust
//! use espalier_resolve::ResolveOptions;
//!
//! let options = ResolveOptions::new().shared_cache(true);
//! assert!(options.cache_enabled);
//! assert!(options.shared_cache);
//! ```

pub mod adapter;
pub mod cache;
pub mod collect;
pub mod config;
pub mod engine;
pub mod error;
pub mod lazy;
pub mod logging;
pub mod path;
pub mod record;
pub mod slot;
pub mod store;
pub mod traits;
pub mod value;

pub use error::{ErrorCode, ErrorContext, ResolveError, ResolveResult, Suggestion};

// Re-export the engine and its configuration
pub use config::{ENV_CACHE_ENABLED, ENV_SHARED_CACHE, ResolveOptions};
pub use engine::ResolveEngine;

// Re-export payload types
pub use path::{Path, Segment};
pub use record::{Key, Record};
pub use value::Value;

// Re-export discovery types
pub use collect::{CollectedRefs, Collector, KeyOrRecord, RefKeys, RefTuple};

// Re-export cache and placeholder types
pub use cache::{BatchCache, CacheStats};
pub use lazy::{KeySpec, LazyResolved, LazyValue};

// Re-export typed resolution types
pub use adapter::{FnHook, ValidationHook};
pub use slot::{Ref, RefList};
pub use store::{FetchCall, MemoryStore};
pub use traits::{BoxFuture, EntityStore, Resolvable, ResolveCx};

// Re-export logging utilities
pub use logging::{
    init as init_logging, init_debug, init_with_level, is_debug_enabled, log_format, log_level,
};

// Re-export tracing for the conditional logging macros
pub use tracing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::adapter::{FnHook, ValidationHook};
    pub use crate::cache::BatchCache;
    pub use crate::config::ResolveOptions;
    pub use crate::engine::ResolveEngine;
    pub use crate::error::{ResolveError, ResolveResult};
    pub use crate::record::{Key, Record};
    pub use crate::slot::{Ref, RefList};
    pub use crate::store::MemoryStore;
    pub use crate::traits::{BoxFuture, EntityStore, Resolvable, ResolveCx};
    pub use crate::value::Value;

    // Schema types needed by almost every caller
    pub use espalier_schema::{EntityDef, FieldShape, Registry, StructDef};
}
