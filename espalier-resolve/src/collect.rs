//! Recursive reference discovery over validated data.
//!
//! The collector walks a validated payload against its structure's relation
//! table and gathers every entity reference it finds, grouped by entity
//! type and tagged with the dotted path to the holding field. The result
//! is the unit of work for cache building: one batch fetch per group.
//!
//! Collection is deliberately lenient. Malformed payloads were rejected
//! upstream by validation, so a field that cannot be read as a reference
//! is skipped rather than reported. Fields already holding a placeholder
//! from an earlier pass are skipped too, which keeps repeated cache builds
//! from descending into their own substitutions.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use espalier_schema::{Registry, RelationKind};

use crate::error::{ResolveError, ResolveResult};
use crate::path::Path;
use crate::record::{Key, Record};
use crate::slot::ENTITY_FIELD;
use crate::value::Value;

/// References found in one payload, grouped by entity type.
///
/// Groups and tuples appear in discovery order.
pub type CollectedRefs = IndexMap<SmolStr, Vec<RefTuple>>;

/// One discovered reference site.
#[derive(Debug, Clone, PartialEq)]
pub struct RefTuple {
    /// Dotted path to the field holding the reference.
    pub path: Path,
    /// The key(s) found there.
    pub keys: RefKeys,
}

/// Keys at a reference site, mirroring the field's arity.
#[derive(Debug, Clone, PartialEq)]
pub enum RefKeys {
    /// A single-reference field.
    One(KeyOrRecord),
    /// A reference collection, in payload order with duplicates.
    Many(Vec<KeyOrRecord>),
}

/// A discovered key, possibly carrying inline record data.
///
/// Payloads may embed the referenced data instead of just its key. Such
/// inline records are seeded into the cache up front so the batch fetch
/// skips them.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOrRecord {
    /// A bare key to fetch.
    Key(Key),
    /// Inline data that already satisfies the reference.
    Record(Arc<Record>),
}

impl KeyOrRecord {
    /// The referenced key.
    pub fn key(&self) -> &Key {
        match self {
            KeyOrRecord::Key(key) => key,
            KeyOrRecord::Record(record) => record.key(),
        }
    }

    /// The inline record, when the payload embedded one.
    pub fn record(&self) -> Option<&Arc<Record>> {
        match self {
            KeyOrRecord::Key(_) => None,
            KeyOrRecord::Record(record) => Some(record),
        }
    }
}

/// Walks validated payloads and gathers their entity references.
#[derive(Debug, Clone, Copy)]
pub struct Collector<'a> {
    registry: &'a Registry,
}

impl<'a> Collector<'a> {
    /// Collector over a registry's relation tables.
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Gather every reference in `value`, a payload (or list of payloads)
    /// validated against `struct_name`.
    ///
    /// For a top-level list, paths carry the element index as their first
    /// segment. The only error is an unknown structure name; anything
    /// unreadable inside the payload is skipped.
    pub fn collect(&self, struct_name: &str, value: &Value) -> ResolveResult<CollectedRefs> {
        if self.registry.structure(struct_name).is_none() {
            return Err(ResolveError::unknown_struct(struct_name));
        }

        let mut out = CollectedRefs::new();
        match value {
            Value::Map(fields) => self.walk_struct(struct_name, fields, &Path::root(), &mut out),
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if let Value::Map(fields) = item {
                        let base = Path::root().child_index(index);
                        self.walk_struct(struct_name, fields, &base, &mut out);
                    }
                }
            }
            _ => {}
        }
        Ok(out)
    }

    fn walk_struct(
        &self,
        struct_name: &str,
        fields: &IndexMap<SmolStr, Value>,
        base: &Path,
        out: &mut CollectedRefs,
    ) {
        let Some(relations) = self.registry.relations(struct_name) else {
            return;
        };

        for (field_name, rel) in relations.iter() {
            let Some(value) = fields.get(field_name) else {
                continue;
            };
            let path = base.child_field(field_name.clone());

            match rel.kind {
                RelationKind::SingleReference => {
                    if let Some((entity, elem)) = self.element(rel.target(), value) {
                        push(out, entity, path, RefKeys::One(elem));
                    }
                }
                RelationKind::ReferenceCollection => {
                    if let Value::List(items) = value {
                        if let Some((entity, elems)) = self.list_elements(rel.target(), items) {
                            push(out, entity, path, RefKeys::Many(elems));
                        }
                    }
                }
                RelationKind::NestedSingle => {
                    if let Value::Map(nested) = value {
                        self.walk_struct(rel.target(), nested, &path, out);
                    }
                }
                RelationKind::NestedCollection => {
                    if let Value::List(items) = value {
                        for (index, item) in items.iter().enumerate() {
                            if let Value::Map(nested) = item {
                                self.walk_struct(
                                    rel.target(),
                                    nested,
                                    &path.child_index(index),
                                    out,
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    /// Read one reference value against its declared target entity.
    ///
    /// Returns the concrete entity the key belongs to, which differs from
    /// the declared target when a discriminated map narrows an abstract
    /// entity. `None` means the value is not collectable here.
    fn element(&self, declared: &str, value: &Value) -> Option<(SmolStr, KeyOrRecord)> {
        match value {
            Value::Int(id) => {
                let entity = self.concrete(declared)?;
                Some((entity, KeyOrRecord::Key(Key::Int(*id))))
            }
            Value::String(key) => {
                let entity = self.concrete(declared)?;
                Some((entity, KeyOrRecord::Key(Key::Str(SmolStr::new(key)))))
            }
            Value::Map(map) => self.map_element(declared, map),
            Value::Record(record) => self.record_element(declared, record),
            _ => None,
        }
    }

    fn map_element(
        &self,
        declared: &str,
        map: &IndexMap<SmolStr, Value>,
    ) -> Option<(SmolStr, KeyOrRecord)> {
        let entity: SmolStr = match map.get(ENTITY_FIELD) {
            Some(Value::String(name)) => SmolStr::new(name),
            Some(_) => return None,
            None => SmolStr::new(declared),
        };
        let def = self.registry.entity(&entity)?;
        if def.is_abstract() {
            return None;
        }

        let key = Key::from_value(map.get(def.key_field())?)?;

        // Any payload beyond the key field makes this an inline record.
        let has_payload = map
            .keys()
            .any(|name| name != ENTITY_FIELD && name != def.key_field());
        if has_payload {
            let mut record = Record::new(entity.clone(), key);
            for (name, value) in map {
                if name != ENTITY_FIELD {
                    record.set(name.clone(), value.clone());
                }
            }
            Some((entity, KeyOrRecord::Record(Arc::new(record))))
        } else {
            Some((entity, KeyOrRecord::Key(key)))
        }
    }

    fn record_element(
        &self,
        declared: &str,
        record: &Arc<Record>,
    ) -> Option<(SmolStr, KeyOrRecord)> {
        let def = self.registry.entity(record.entity())?;
        if def.is_abstract() {
            return None;
        }
        let declared_def = self.registry.entity(declared)?;
        if !declared_def.is_abstract() && record.entity() != declared {
            return None;
        }
        Some((
            SmolStr::new(record.entity()),
            KeyOrRecord::Record(Arc::clone(record)),
        ))
    }

    /// Read a whole reference collection.
    ///
    /// Every element must be readable and target one entity type, since the
    /// collection is replaced by a single placeholder. An unreadable or
    /// mismatched element drops the whole field from collection.
    fn list_elements(
        &self,
        declared: &str,
        items: &[Value],
    ) -> Option<(SmolStr, Vec<KeyOrRecord>)> {
        let mut entity: Option<SmolStr> = None;
        let mut elems = Vec::with_capacity(items.len());

        for item in items {
            let (elem_entity, elem) = self.element(declared, item)?;
            match &entity {
                None => entity = Some(elem_entity),
                Some(current) if *current != elem_entity => return None,
                Some(_) => {}
            }
            elems.push(elem);
        }

        Some((entity.unwrap_or_else(|| SmolStr::new(declared)), elems))
    }

    /// The declared entity itself, when keys may be grouped under it.
    fn concrete(&self, declared: &str) -> Option<SmolStr> {
        let def = self.registry.entity(declared)?;
        if def.is_abstract() {
            return None;
        }
        Some(SmolStr::new(declared))
    }
}

fn push(out: &mut CollectedRefs, entity: SmolStr, path: Path, keys: RefKeys) {
    out.entry(entity).or_default().push(RefTuple { path, keys });
}
