//! Fuzz target for typed reference slot decoding.
//!
//! This target feeds arbitrary JSON documents to `Ref::from_value` and
//! `RefList::from_value`. Slot decoding is strict, so malformed shapes must
//! surface as errors, never as panics.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_slot_decode
//! ```

#![no_main]

use std::sync::LazyLock;

use espalier_resolve::slot::{Ref, RefList};
use espalier_resolve::value::Value;
use espalier_schema::{EntityDef, FieldShape, Registry, StructDef};
use libfuzzer_sys::fuzz_target;

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    Registry::builder()
        .entity(EntityDef::new("User", "id"))
        .entity(EntityDef::abstract_entity("Asset", "id"))
        .entity(EntityDef::new("Stock", "id"))
        .structure(StructDef::new("Order").field("buyer", FieldShape::reference("User")))
        .build()
        .expect("fuzz registry builds")
});

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let value = Value::from_json(&json);

    // Decoding must never panic for any declared target.
    let _ = Ref::from_value(&REGISTRY, "User", &value);
    let _ = Ref::from_value(&REGISTRY, "Asset", &value);
    let _ = RefList::from_value(&REGISTRY, "User", &value);
    let _ = RefList::from_value(&REGISTRY, "Asset", &value);
});
