//! Entity keys and fetched records.
//!
//! A [`Key`] is the scalar identity of one entity (integer or string). A
//! [`Record`] is one fetched entity: its type name, its key, and an ordered
//! field map. Records are shared behind `Arc` once fetched; the cache, lazy
//! placeholders, and resolved slots all hold the same allocation.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::value::Value;

// ============================================================================
// Key
// ============================================================================

/// The primary-key scalar of an entity.
///
/// Integer and string keys are supported; the wire format uses whichever the
/// backing store uses.
///
/// # Example
///
/// ```rust
/// use espalier_resolve::Key;
///
/// let a = Key::from(5);
/// let b = Key::from("us-east");
/// assert_eq!(a.to_string(), "5");
/// assert_eq!(b.to_string(), "us-east");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(SmolStr),
}

impl Key {
    /// Extract a key from a raw tree value, if it is key-shaped.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Int(n) => Some(Key::Int(*n)),
            Value::String(s) => Some(Key::Str(SmolStr::new(s))),
            _ => None,
        }
    }

    /// Extract a key from a JSON scalar, if it is key-shaped.
    pub fn from_json(value: &serde_json::Value) -> Option<Key> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Key::Int),
            serde_json::Value::String(s) => Some(Key::Str(SmolStr::new(s))),
            _ => None,
        }
    }

    /// Whether this is an integer key.
    pub fn is_int(&self) -> bool {
        matches!(self, Key::Int(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(SmolStr::new(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(SmolStr::new(s))
    }
}

impl From<SmolStr> for Key {
    fn from(s: SmolStr) -> Self {
        Key::Str(s)
    }
}

// ============================================================================
// Record
// ============================================================================

/// One fetched entity: type name, key, and ordered fields.
///
/// # Example
///
/// ```rust
/// use espalier_resolve::{Key, Record};
///
/// let user = Record::new("User", 5)
///     .with_field("name", "ada")
///     .with_field("active", true);
///
/// assert_eq!(user.entity(), "User");
/// assert_eq!(user.key(), &Key::Int(5));
/// assert_eq!(user.to_string(), "User(5)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: SmolStr,
    key: Key,
    fields: IndexMap<SmolStr, Value>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(entity: impl Into<SmolStr>, key: impl Into<Key>) -> Self {
        Self {
            entity: entity.into(),
            key: key.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field, builder style.
    pub fn with_field(mut self, name: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The entity type name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The primary key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Read one field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Mutably read one field.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Write one field.
    pub fn set(&mut self, name: impl Into<SmolStr>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// The ordered field map.
    pub fn fields(&self) -> &IndexMap<SmolStr, Value> {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.entity, self.key)
    }
}
