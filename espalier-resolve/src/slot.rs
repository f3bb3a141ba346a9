//! Typed reference slots for host structs.
//!
//! [`Ref`] and [`RefList`] are the fields a host type declares where its
//! wire format carries entity references. They decode from validated
//! [`Value`] data in whatever shape the reference arrived: a bare key, a
//! key map, an already-substituted placeholder, or a full record. Calling
//! [`Ref::resolve`] (usually via [`Resolvable`]) collapses the slot to
//! records, after which the host reads them directly.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;

use espalier_schema::Registry;

use crate::error::{ResolveError, ResolveResult};
use crate::lazy::{KeySpec, LazyResolved, LazyValue, merge_ordered};
use crate::record::{Key, Record};
use crate::traits::{BoxFuture, Resolvable, ResolveCx};
use crate::value::Value;

/// Map field that selects the concrete entity for an abstract target.
pub(crate) const ENTITY_FIELD: &str = "entity";

// ============================================================================
// Single Reference
// ============================================================================

/// A single-reference slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Ref {
    entity: SmolStr,
    state: RefState,
}

#[derive(Debug, Clone, PartialEq)]
enum RefState {
    Raw(Key),
    Lazy(LazyValue),
    Resolved(Arc<Record>),
}

impl Ref {
    /// Slot holding a bare key against a declared entity type.
    pub fn new(entity: impl Into<SmolStr>, key: impl Into<Key>) -> Self {
        Self {
            entity: entity.into(),
            state: RefState::Raw(key.into()),
        }
    }

    /// Slot already holding its record.
    pub fn resolved(record: Arc<Record>) -> Self {
        Self {
            entity: record.entity().into(),
            state: RefState::Resolved(record),
        }
    }

    /// Decode a slot from a validated value.
    ///
    /// Accepts a bare integer or string key, a map carrying the target's key
    /// field (with an optional `"entity"` discriminator selecting a concrete
    /// type for an abstract target), a placeholder left by cache building,
    /// or a full record.
    pub fn from_value(registry: &Registry, declared: &str, value: &Value) -> ResolveResult<Self> {
        match value {
            Value::Lazy(lazy) => {
                if lazy.is_many() {
                    return Err(ResolveError::invalid_reference(format!(
                        "single-reference field received a list placeholder for \"{}\"",
                        lazy.entity()
                    )));
                }
                Ok(Self {
                    entity: lazy.entity().into(),
                    state: RefState::Lazy(lazy.clone()),
                })
            }
            Value::Record(record) => Ok(Self::resolved(Arc::clone(record))),
            Value::Int(id) => Ok(Self::new(declared, *id)),
            Value::String(key) => Ok(Self::new(declared, Key::Str(SmolStr::new(key)))),
            Value::Map(map) => {
                let (entity, key) = reference_target(registry, declared, map)?;
                Ok(Self {
                    entity,
                    state: RefState::Raw(key),
                })
            }
            Value::Null => Err(ResolveError::invalid_reference(
                "null is not a reference; declare the field as optional instead",
            )),
            other => Err(ResolveError::invalid_reference(format!(
                "expected a key, map, or record, found {}",
                other.kind()
            ))),
        }
    }

    /// The entity type this slot points at.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The referenced key, when one is known.
    pub fn key(&self) -> Option<&Key> {
        match &self.state {
            RefState::Raw(key) => Some(key),
            RefState::Lazy(lazy) => match lazy.keys() {
                KeySpec::One(key) => Some(key),
                KeySpec::Many(_) => None,
            },
            RefState::Resolved(record) => Some(record.key()),
        }
    }

    /// The record, once resolved.
    pub fn record(&self) -> Option<&Arc<Record>> {
        match &self.state {
            RefState::Resolved(record) => Some(record),
            _ => None,
        }
    }

    /// Whether [`resolve`](Self::resolve) has already collapsed this slot.
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, RefState::Resolved(_))
    }

    /// Whether this slot holds a cache placeholder.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, RefState::Lazy(_))
    }

    /// Collapse this slot to its record.
    ///
    /// Resolving an already-resolved slot is a no-op. A placeholder goes
    /// through its cache; a bare key is checked against the registry and
    /// fetched directly. An abstract target fails before any fetch.
    pub async fn resolve(&mut self, cx: &ResolveCx<'_>) -> ResolveResult<()> {
        let record = match &self.state {
            RefState::Resolved(_) => return Ok(()),
            RefState::Lazy(lazy) => match lazy.retrieve(cx.store()).await? {
                LazyResolved::One(record) => record,
                LazyResolved::Many(_) => {
                    return Err(ResolveError::internal(
                        "single-reference placeholder produced a record list",
                    ));
                }
            },
            RefState::Raw(key) => {
                let def = cx
                    .registry()
                    .entity(&self.entity)
                    .ok_or_else(|| ResolveError::unknown_entity(self.entity.as_str()))?;
                if def.is_abstract() {
                    return Err(ResolveError::abstract_target(self.entity.as_str()));
                }
                tracing::trace!(entity = %self.entity, key = %key, "direct reference fetch");
                cx.store().fetch_one(&self.entity, key).await?
            }
        };
        self.state = RefState::Resolved(record);
        Ok(())
    }
}

impl Resolvable for Ref {
    fn resolve_refs<'a>(&'a mut self, cx: &'a ResolveCx<'a>) -> BoxFuture<'a, ResolveResult<()>> {
        Box::pin(self.resolve(cx))
    }
}

// ============================================================================
// Reference Collection
// ============================================================================

/// A reference-collection slot holding an ordered key list.
#[derive(Debug, Clone, PartialEq)]
pub struct RefList {
    entity: SmolStr,
    state: RefListState,
}

#[derive(Debug, Clone, PartialEq)]
enum RefListState {
    Raw(Vec<Key>),
    Lazy(LazyValue),
    Resolved(Vec<Arc<Record>>),
}

impl RefList {
    /// Slot holding bare keys against a declared entity type.
    pub fn new(
        entity: impl Into<SmolStr>,
        keys: impl IntoIterator<Item = impl Into<Key>>,
    ) -> Self {
        Self {
            entity: entity.into(),
            state: RefListState::Raw(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Slot already holding its records.
    pub fn resolved(entity: impl Into<SmolStr>, records: Vec<Arc<Record>>) -> Self {
        Self {
            entity: entity.into(),
            state: RefListState::Resolved(records),
        }
    }

    /// Decode a slot from a validated value.
    ///
    /// Accepts a list of keys, key maps, and records, or a list placeholder
    /// left by cache building. Every element must target the same entity
    /// type, since the slot fetches as one batch.
    pub fn from_value(registry: &Registry, declared: &str, value: &Value) -> ResolveResult<Self> {
        match value {
            Value::Lazy(lazy) => {
                if !lazy.is_many() {
                    return Err(ResolveError::invalid_reference(format!(
                        "collection field received a single placeholder for \"{}\"",
                        lazy.entity()
                    )));
                }
                Ok(Self {
                    entity: lazy.entity().into(),
                    state: RefListState::Lazy(lazy.clone()),
                })
            }
            Value::List(items) => {
                if items.is_empty() {
                    return Ok(Self {
                        entity: declared.into(),
                        state: RefListState::Raw(Vec::new()),
                    });
                }

                // Lists of full records stay resolved.
                let all_records: Option<Vec<&Arc<Record>>> =
                    items.iter().map(Value::as_record).collect();
                if let Some(records) = all_records {
                    let entity = uniform_entity(records.iter().map(|r| r.entity()))?;
                    return Ok(Self {
                        entity: entity.into(),
                        state: RefListState::Resolved(
                            records.into_iter().map(Arc::clone).collect(),
                        ),
                    });
                }

                let mut targets = Vec::with_capacity(items.len());
                for item in items {
                    targets.push(element_target(registry, declared, item)?);
                }
                let entity = uniform_entity(targets.iter().map(|(entity, _)| entity.as_str()))?;
                let entity = SmolStr::new(entity);
                Ok(Self {
                    state: RefListState::Raw(targets.into_iter().map(|(_, key)| key).collect()),
                    entity,
                })
            }
            Value::Null => Err(ResolveError::invalid_reference(
                "null is not a reference collection; declare the field as optional instead",
            )),
            other => Err(ResolveError::invalid_reference(format!(
                "expected a list, found {}",
                other.kind()
            ))),
        }
    }

    /// The entity type this slot points at.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Number of referenced records, duplicates counted.
    pub fn len(&self) -> usize {
        match &self.state {
            RefListState::Raw(keys) => keys.len(),
            RefListState::Lazy(lazy) => lazy.keys().len(),
            RefListState::Resolved(records) => records.len(),
        }
    }

    /// Whether this slot references nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The records in original key order, once resolved.
    pub fn records(&self) -> Option<&[Arc<Record>]> {
        match &self.state {
            RefListState::Resolved(records) => Some(records),
            _ => None,
        }
    }

    /// Whether [`resolve`](Self::resolve) has already collapsed this slot.
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, RefListState::Resolved(_))
    }

    /// Whether this slot holds a cache placeholder.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, RefListState::Lazy(_))
    }

    /// Collapse this slot to its records, preserving order and duplicates.
    ///
    /// Bare keys are deduplicated into a single batch fetch; an empty list
    /// resolves without touching the store.
    pub async fn resolve(&mut self, cx: &ResolveCx<'_>) -> ResolveResult<()> {
        let records = match &self.state {
            RefListState::Resolved(_) => return Ok(()),
            RefListState::Lazy(lazy) => match lazy.retrieve(cx.store()).await? {
                LazyResolved::Many(records) => records,
                LazyResolved::One(_) => {
                    return Err(ResolveError::internal(
                        "collection placeholder produced a single record",
                    ));
                }
            },
            RefListState::Raw(keys) => {
                if keys.is_empty() {
                    Vec::new()
                } else {
                    let def = cx
                        .registry()
                        .entity(&self.entity)
                        .ok_or_else(|| ResolveError::unknown_entity(self.entity.as_str()))?;
                    if def.is_abstract() {
                        return Err(ResolveError::abstract_target(self.entity.as_str()));
                    }
                    let unique: Vec<Key> = keys
                        .iter()
                        .cloned()
                        .collect::<IndexSet<Key>>()
                        .into_iter()
                        .collect();
                    tracing::trace!(
                        entity = %self.entity,
                        keys = unique.len(),
                        "direct collection fetch"
                    );
                    let fetched = cx.store().fetch_by_keys(&self.entity, &unique).await?;
                    merge_ordered(&self.entity, keys, &HashMap::new(), &fetched)?
                }
            }
        };
        self.state = RefListState::Resolved(records);
        Ok(())
    }
}

impl Resolvable for RefList {
    fn resolve_refs<'a>(&'a mut self, cx: &'a ResolveCx<'a>) -> BoxFuture<'a, ResolveResult<()>> {
        Box::pin(self.resolve(cx))
    }
}

// ============================================================================
// Decode Helpers
// ============================================================================

/// Resolve a key map to its (entity, key) target.
fn reference_target(
    registry: &Registry,
    declared: &str,
    map: &IndexMap<SmolStr, Value>,
) -> ResolveResult<(SmolStr, Key)> {
    let discriminated = map.contains_key(ENTITY_FIELD);
    let entity: SmolStr = match map.get(ENTITY_FIELD) {
        Some(Value::String(name)) => SmolStr::new(name),
        Some(other) => {
            return Err(ResolveError::invalid_reference(format!(
                "\"{ENTITY_FIELD}\" discriminator must be a string, found {}",
                other.kind()
            )));
        }
        None => SmolStr::new(declared),
    };

    let def = registry
        .entity(&entity)
        .ok_or_else(|| ResolveError::unknown_entity(entity.as_str()))?;
    if def.is_abstract() {
        if discriminated {
            return Err(ResolveError::invalid_reference(format!(
                "discriminator \"{entity}\" names an abstract entity"
            )));
        }
        return Err(ResolveError::abstract_target(entity.as_str()));
    }

    let key_value = map.get(def.key_field()).ok_or_else(|| {
        ResolveError::invalid_reference(format!(
            "map for \"{entity}\" is missing its key field \"{}\"",
            def.key_field()
        ))
    })?;
    let key = Key::from_value(key_value).ok_or_else(|| {
        ResolveError::invalid_reference(format!(
            "key field \"{}\" must be an integer or string, found {}",
            def.key_field(),
            key_value.kind()
        ))
    })?;
    Ok((entity, key))
}

/// Resolve one collection element to its (entity, key) target.
fn element_target(
    registry: &Registry,
    declared: &str,
    value: &Value,
) -> ResolveResult<(SmolStr, Key)> {
    match value {
        Value::Int(id) => Ok((SmolStr::new(declared), Key::Int(*id))),
        Value::String(key) => Ok((SmolStr::new(declared), Key::Str(SmolStr::new(key)))),
        Value::Record(record) => Ok((SmolStr::new(record.entity()), record.key().clone())),
        Value::Map(map) => reference_target(registry, declared, map),
        other => Err(ResolveError::invalid_reference(format!(
            "collection element must be a key, map, or record, found {}",
            other.kind()
        ))),
    }
}

/// Require every element of a collection to target one entity type.
fn uniform_entity<'a>(mut entities: impl Iterator<Item = &'a str>) -> ResolveResult<&'a str> {
    let Some(first) = entities.next() else {
        return Err(ResolveError::internal("uniformity check on empty collection"));
    };
    for entity in entities {
        if entity != first {
            return Err(ResolveError::invalid_reference(format!(
                "collection mixes entity types \"{first}\" and \"{entity}\""
            )));
        }
    }
    Ok(first)
}
