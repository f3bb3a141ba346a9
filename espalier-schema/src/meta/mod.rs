//! Static metadata for entities and structured types.
//!
//! Everything in this module is declaration-time data: it describes shapes,
//! never instances. The [`crate::Registry`] validates these definitions and
//! precomputes relation classification tables from them.

mod entity;
mod field;
mod structure;

pub use entity::EntityDef;
pub use field::{FieldDef, FieldShape, ScalarKind};
pub use structure::StructDef;
