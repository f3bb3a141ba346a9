//! Integration tests for the two-phase resolution pipeline.
//!
//! These tests drive the engine end to end through the public facade:
//! - Reference discovery and per-entity batch fetching
//! - Placeholder substitution and retrieval
//! - Typed slot collapsing via `fetch_cache`
//! - Pass-through behavior when caching is disabled

use std::sync::Arc;

use espalier::prelude::*;
use espalier::resolve::{ErrorCode, LazyResolved};
use serde_json::json;

fn registry() -> Arc<Registry> {
    Arc::new(
        Registry::builder()
            .entity(EntityDef::new("User", "id"))
            .entity(EntityDef::new("Product", "sku"))
            .entity(EntityDef::abstract_entity("Asset", "id"))
            .entity(EntityDef::new("Stock", "id"))
            .entity(EntityDef::new("Bond", "id"))
            .structure(
                StructDef::new("Order")
                    .field("buyer", FieldShape::reference("User"))
                    .field("items", FieldShape::reference_list("Product"))
                    .field("note", FieldShape::string()),
            )
            .structure(StructDef::new("Settings").field("sponsor", FieldShape::reference("User")))
            .structure(
                StructDef::new("Portfolio")
                    .field("owner", FieldShape::reference("User"))
                    .field("primary", FieldShape::reference("Asset"))
                    .field("hedge", FieldShape::reference("Asset"))
                    .field("holdings", FieldShape::reference_list("Asset"))
                    .field("settings", FieldShape::structure("Settings")),
            )
            .structure(StructDef::new("OrderBook").field("orders", FieldShape::structure_list("Order")))
            .build()
            .expect("registry should build"),
    )
}

fn store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with(Record::new("User", 1).with_field("name", "ada"))
            .with(Record::new("User", 2).with_field("name", "grace"))
            .with(Record::new("User", 3).with_field("name", "edsger"))
            .with(Record::new("Product", "A").with_field("label", "anvil"))
            .with(Record::new("Product", "B").with_field("label", "bolt"))
            .with(Record::new("Product", "C").with_field("label", "crate"))
            .with(Record::new("Stock", 10).with_field("ticker", "ESP"))
            .with(Record::new("Bond", 20).with_field("coupon", 5)),
    )
}

/// A decoded host with one single-reference slot and one collection slot.
struct Order {
    buyer: Ref,
    items: RefList,
    note: String,
}

impl Resolvable for Order {
    fn resolve_refs<'a>(&'a mut self, cx: &'a ResolveCx<'a>) -> BoxFuture<'a, ResolveResult<()>> {
        Box::pin(async move {
            self.buyer.resolve(cx).await?;
            self.items.resolve(cx).await?;
            Ok(())
        })
    }
}

fn decode_order(registry: &Registry, value: &Value) -> ResolveResult<Order> {
    let buyer = value
        .get("buyer")
        .ok_or_else(|| ResolveError::decode("order is missing `buyer`"))?;
    let items = value
        .get("items")
        .ok_or_else(|| ResolveError::decode("order is missing `items`"))?;
    let note = value
        .get("note")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(Order {
        buyer: Ref::from_value(registry, "User", buyer)?,
        items: RefList::from_value(registry, "Product", items)?,
        note,
    })
}

// ==================== Discovery and Batching Tests ====================

/// Test that discovery produces one store call per referenced entity type
#[tokio::test]
async fn test_build_cache_batches_per_entity_type() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({
        "orders": [
            { "buyer": 1, "items": ["A", "B"], "note": "first" },
            { "buyer": 2, "items": ["B"], "note": "second" },
            { "buyer": 1, "items": ["C"], "note": "third" },
        ]
    })
    .into();
    engine
        .build_cache("OrderBook", &mut payload)
        .await
        .expect("build_cache should succeed");

    let calls = store.calls();
    assert_eq!(calls.len(), 2, "one batch per entity type");

    let users = calls.iter().find(|c| c.entity == "User").expect("User batch");
    assert_eq!(users.keys, [Key::from(1), Key::from(2)]);

    let products = calls
        .iter()
        .find(|c| c.entity == "Product")
        .expect("Product batch");
    assert_eq!(
        products.keys,
        [Key::from("A"), Key::from("B"), Key::from("C")]
    );
}

/// Test that substituted placeholders replace every discovered reference
#[tokio::test]
async fn test_build_cache_substitutes_placeholders() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({ "buyer": 1, "items": ["A"], "note": "n" }).into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");

    let buyer = payload.get("buyer").expect("buyer field");
    assert!(buyer.is_lazy(), "buyer should hold a placeholder");
    let items = payload.get("items").expect("items field");
    assert!(items.is_lazy(), "items should hold a placeholder");
    // Plain fields are left alone.
    assert_eq!(payload.get("note").and_then(Value::as_str), Some("n"));
}

#[tokio::test]
async fn test_collection_placeholder_preserves_order_and_duplicates() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({ "buyer": 1, "items": ["B", "A", "B"], "note": "" }).into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");

    // The batch is deduplicated in first-occurrence order.
    let products = store
        .calls()
        .into_iter()
        .find(|c| c.entity == "Product")
        .expect("Product batch");
    assert_eq!(products.keys, [Key::from("B"), Key::from("A")]);

    // The placeholder reproduces the written order, duplicates included.
    let lazy = payload
        .get("items")
        .and_then(Value::as_lazy)
        .cloned()
        .expect("list placeholder");
    let resolved = lazy.retrieve(&*store).await.expect("retrieve should succeed");
    let LazyResolved::Many(records) = resolved else {
        panic!("expected a list result");
    };
    let keys: Vec<Key> = records.iter().map(|r| r.key().clone()).collect();
    assert_eq!(keys, [Key::from("B"), Key::from("A"), Key::from("B")]);
}

#[tokio::test]
async fn test_top_level_list_batches_across_elements() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!([
        { "buyer": 1, "items": ["A"], "note": "x" },
        { "buyer": 2, "items": ["A", "C"], "note": "y" },
    ])
    .into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");

    assert_eq!(store.fetch_count(), 2);
    let users = store
        .calls()
        .into_iter()
        .find(|c| c.entity == "User")
        .expect("User batch");
    assert_eq!(users.keys, [Key::from(1), Key::from(2)]);
}

#[tokio::test]
async fn test_payload_without_references_is_untouched() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({ "note": "plain" }).into();
    let before = payload.clone();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");

    assert_eq!(payload, before);
    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test]
async fn test_unknown_struct_is_rejected() {
    let engine = ResolveEngine::new(registry(), store());

    let mut payload: Value = json!({}).into();
    let err = engine
        .build_cache("Ghost", &mut payload)
        .await
        .expect_err("unknown struct should fail");
    assert_eq!(*err.error_code(), ErrorCode::UnknownStruct);
}

// ==================== Two-Phase Resolution Tests ====================

/// Test that phase two is served entirely from the pass cache
#[tokio::test]
async fn test_two_phase_resolution_without_refetch() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({ "buyer": 1, "items": ["A", "B", "A"], "note": "hello" }).into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");
    assert_eq!(store.fetch_count(), 2);

    let mut order = decode_order(engine.registry(), &payload).expect("decode should succeed");
    engine
        .fetch_cache(&mut order)
        .await
        .expect("fetch_cache should succeed");

    assert_eq!(store.fetch_count(), 2, "no additional store calls");
    assert!(order.buyer.is_resolved());
    let buyer = order.buyer.record().expect("resolved buyer");
    assert_eq!(buyer.get("name").and_then(Value::as_str), Some("ada"));

    let items = order.items.records().expect("resolved items");
    let keys: Vec<Key> = items.iter().map(|r| r.key().clone()).collect();
    assert_eq!(keys, [Key::from("A"), Key::from("B"), Key::from("A")]);
    assert_eq!(order.note, "hello");
}

#[tokio::test]
async fn test_resolvable_walk_covers_collections() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!([
        { "buyer": 1, "items": [], "note": "a" },
        { "buyer": 2, "items": ["C"], "note": "b" },
    ])
    .into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");

    let elements = payload.as_list().expect("list payload");
    let mut orders: Vec<Order> = elements
        .iter()
        .map(|v| decode_order(engine.registry(), v))
        .collect::<ResolveResult<_>>()
        .expect("decode should succeed");

    engine
        .fetch_cache(&mut orders)
        .await
        .expect("fetch_cache should succeed");
    assert!(orders.iter().all(|o| o.buyer.is_resolved()));
    assert!(orders[0].items.records().expect("resolved").is_empty());
    assert_eq!(orders[1].items.records().expect("resolved").len(), 1);
}

/// Test the hook adapter running decode between the two phases
#[tokio::test]
async fn test_resolve_with_runs_both_phases() {
    struct OrderHook;

    impl ValidationHook for OrderHook {
        type Output = Order;

        fn struct_name(&self) -> &str {
            "Order"
        }

        fn decode(&self, registry: &Registry, value: Value) -> ResolveResult<Self::Output> {
            decode_order(registry, &value)
        }
    }

    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let payload: Value = json!({ "buyer": 2, "items": ["C"], "note": "via hook" }).into();
    let order = engine
        .resolve_with(&OrderHook, payload)
        .await
        .expect("resolve_with should succeed");

    assert_eq!(store.fetch_count(), 2);
    let buyer = order.buyer.record().expect("resolved buyer");
    assert_eq!(buyer.get("name").and_then(Value::as_str), Some("grace"));
    assert_eq!(order.note, "via hook");
}

// ==================== Error Handling Tests ====================

/// Test that a missing key surfaces where the reference is consumed
#[tokio::test]
async fn test_missing_key_fails_at_consumption_not_discovery() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({ "buyer": 404, "items": [], "note": "" }).into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("discovery tolerates missing keys");

    let mut order = decode_order(engine.registry(), &payload).expect("decode should succeed");
    let err = engine
        .fetch_cache(&mut order)
        .await
        .expect_err("missing key should fail at consumption");
    assert!(err.is_not_found());
    assert_eq!(*err.error_code(), ErrorCode::KeyNotFound);
}

/// Test that bare keys cannot target an abstract entity
#[tokio::test]
async fn test_abstract_target_rejected_before_fetch() {
    let registry = registry();
    let store = store();
    let cx = ResolveCx::new(&registry, &*store);

    let mut slot = Ref::new("Asset", 10);
    let err = slot.resolve(&cx).await.expect_err("abstract target should fail");
    assert!(err.is_abstract_target());
    assert_eq!(store.fetch_count(), 0, "no fetch is attempted");
}

/// Test that a discriminator routes references to concrete entities
#[tokio::test]
async fn test_discriminated_references_group_by_entity() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({
        "owner": 1,
        "primary": { "entity": "Stock", "id": 10 },
        "hedge": { "entity": "Bond", "id": 20 },
        "holdings": [],
        "settings": { "sponsor": 2 }
    })
    .into();
    engine
        .build_cache("Portfolio", &mut payload)
        .await
        .expect("build_cache should succeed");

    let calls = store.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().any(|c| c.entity == "Stock" && c.keys == [Key::from(10)]));
    assert!(calls.iter().any(|c| c.entity == "Bond" && c.keys == [Key::from(20)]));

    // Nested references batch with top-level ones of the same type.
    let users = calls.iter().find(|c| c.entity == "User").expect("User batch");
    assert_eq!(users.keys, [Key::from(1), Key::from(2)]);
}

// ==================== Seeding and Idempotence Tests ====================

/// Test that an inline record seeds the cache instead of being fetched
#[tokio::test]
async fn test_inline_record_seeds_cache() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({
        "buyer": { "entity": "User", "id": 77, "name": "inline" },
        "items": [],
        "note": ""
    })
    .into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");
    assert_eq!(store.fetch_count(), 0, "the payload already carries the record");

    let mut order = decode_order(engine.registry(), &payload).expect("decode should succeed");
    engine
        .fetch_cache(&mut order)
        .await
        .expect("fetch_cache should succeed");
    assert_eq!(store.fetch_count(), 0);

    let buyer = order.buyer.record().expect("resolved buyer");
    assert_eq!(buyer.key(), &Key::from(77));
    assert_eq!(buyer.get("name").and_then(Value::as_str), Some("inline"));
}

/// Test that re-running discovery on a substituted payload is a no-op
#[tokio::test]
async fn test_build_cache_is_idempotent() {
    let store = store();
    let engine = ResolveEngine::new(registry(), store.clone());

    let mut payload: Value = json!({ "buyer": 1, "items": ["A"], "note": "" }).into();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("first build should succeed");
    let after_first = store.fetch_count();

    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("second build should succeed");
    assert_eq!(store.fetch_count(), after_first, "placeholders are not re-collected");
}

// ==================== Disabled Engine Tests ====================

/// Test that a disabled engine leaves payloads untouched
#[tokio::test]
async fn test_disabled_engine_passes_payload_through() {
    let store = store();
    let engine =
        ResolveEngine::new(registry(), store.clone()).with_options(ResolveOptions::disabled());

    let mut payload: Value = json!({ "buyer": 1, "items": ["A", "B", "A"], "note": "raw" }).into();
    let before = payload.clone();
    engine
        .build_cache("Order", &mut payload)
        .await
        .expect("build_cache should succeed");

    assert_eq!(payload, before, "no substitution happens");
    assert_eq!(store.fetch_count(), 0);

    // Slots still resolve, by fetching directly.
    let mut order = decode_order(engine.registry(), &payload).expect("decode should succeed");
    engine
        .fetch_cache(&mut order)
        .await
        .expect("fetch_cache should succeed");
    assert_eq!(store.fetch_count(), 2, "one direct fetch per slot");

    let items = order.items.records().expect("resolved items");
    let keys: Vec<Key> = items.iter().map(|r| r.key().clone()).collect();
    assert_eq!(keys, [Key::from("A"), Key::from("B"), Key::from("A")]);
}
