//! The raw data tree handled by the collection and substitution passes.
//!
//! [`Value`] is the wire-shaped tree (scalars, lists, ordered maps) extended
//! with two in-memory-only variants: [`Value::Record`] for inline entity
//! records already present in the input, and [`Value::Lazy`] for the
//! placeholders written in by `build_cache`. Neither crosses the
//! serialization boundary: converting a tree that still holds a placeholder
//! to JSON fails with a [leaked-placeholder](crate::ResolveError::pending_leak)
//! error naming the offending path.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::{ResolveError, ResolveResult};
use crate::lazy::LazyValue;
use crate::path::Path;
use crate::record::{Key, Record};

/// A node in the raw data tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Ordered string-keyed map.
    Map(IndexMap<SmolStr, Value>),
    /// An inline entity record, kept whole and never re-fetched.
    Record(Arc<Record>),
    /// A reference placeholder awaiting resolution.
    Lazy(LazyValue),
}

impl Value {
    /// Build a tree from wire JSON.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (SmolStr::new(k), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to wire JSON.
    ///
    /// Fails if any [`Value::Lazy`] placeholder is still present, naming the
    /// path where it sits. Inline records serialize to their field map.
    pub fn to_json(&self) -> ResolveResult<serde_json::Value> {
        let mut path = Path::root();
        jsonify(self, &mut path)
    }

    /// A short name for the node's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Lazy(_) => "lazy",
        }
    }

    /// Whether this node is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this node is a placeholder.
    pub fn is_lazy(&self) -> bool {
        matches!(self, Value::Lazy(_))
    }

    /// Read a named field from a map or inline record.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(name),
            Value::Record(record) => record.get(name),
            _ => None,
        }
    }

    /// Read a list element.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(index),
            _ => None,
        }
    }

    /// View as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// View as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// View as a float (integers widen).
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// View as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// View as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// View as a map.
    pub fn as_map(&self) -> Option<&IndexMap<SmolStr, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// View as an inline record.
    pub fn as_record(&self) -> Option<&Arc<Record>> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// View as a placeholder.
    pub fn as_lazy(&self) -> Option<&LazyValue> {
        match self {
            Value::Lazy(lazy) => Some(lazy),
            _ => None,
        }
    }
}

fn jsonify(value: &Value, path: &mut Path) -> ResolveResult<serde_json::Value> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::Number((*n).into())),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                ResolveError::internal(format!("non-finite float at {}", path))
            }),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push_index(index);
                let converted = jsonify(item, path);
                path.pop();
                out.push(converted?);
            }
            Ok(serde_json::Value::Array(out))
        }
        Value::Map(entries) => {
            let mut out = serde_json::Map::with_capacity(entries.len());
            for (name, entry) in entries {
                path.push_field(name.clone());
                let converted = jsonify(entry, path);
                path.pop();
                out.insert(name.to_string(), converted?);
            }
            Ok(serde_json::Value::Object(out))
        }
        Value::Record(record) => {
            let mut out = serde_json::Map::with_capacity(record.len());
            for (name, entry) in record.fields() {
                path.push_field(name.clone());
                let converted = jsonify(entry, path);
                path.pop();
                out.insert(name.to_string(), converted?);
            }
            Ok(serde_json::Value::Object(out))
        }
        Value::Lazy(_) => Err(ResolveError::pending_leak(path.to_string())),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(n) => Value::Int(n),
            Key::Str(s) => Value::String(s.to_string()),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(Arc::new(record))
    }
}

impl From<Arc<Record>> for Value {
    fn from(record: Arc<Record>) -> Self {
        Value::Record(record)
    }
}

impl From<LazyValue> for Value {
    fn from(lazy: LazyValue) -> Self {
        Value::Lazy(lazy)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}
