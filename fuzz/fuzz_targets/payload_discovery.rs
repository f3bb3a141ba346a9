//! Fuzz target for wire payload conversion and reference discovery.
//!
//! This target feeds arbitrary JSON documents through value conversion and
//! the reference collector to find crashes and panics. Discovery is lenient
//! by design, so any JSON shape must come back as either a collection of
//! references or a clean skip.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_payload_discovery
//! ```

#![no_main]

use std::sync::LazyLock;

use espalier_resolve::collect::Collector;
use espalier_resolve::value::Value;
use espalier_schema::{EntityDef, FieldShape, Registry, StructDef};
use libfuzzer_sys::fuzz_target;

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    Registry::builder()
        .entity(EntityDef::new("User", "id"))
        .entity(EntityDef::abstract_entity("Asset", "id"))
        .entity(EntityDef::new("Stock", "id"))
        .structure(
            StructDef::new("Order")
                .field("buyer", FieldShape::reference("User"))
                .field("items", FieldShape::reference_list("User"))
                .field("hedge", FieldShape::reference("Asset"))
                .field("holdings", FieldShape::reference_list("Asset"))
                .field("parent", FieldShape::structure("Order"))
                .field("children", FieldShape::structure_list("Order")),
        )
        .build()
        .expect("fuzz registry builds")
});

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    // Conversion must never panic, and values converted from JSON carry no
    // placeholders, so they must convert back.
    let value = Value::from_json(&json);
    let round_trip = value.to_json();
    assert!(round_trip.is_ok());

    // Discovery must never panic on any payload shape.
    let collector = Collector::new(&REGISTRY);
    let _ = collector.collect("Order", &value);
});
