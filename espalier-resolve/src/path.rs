//! Dotted paths locating values inside a nested tree.
//!
//! A path is a sequence of field names and list indices, printed with dots:
//! `children.2.owner` means field `children`, element 2, field `owner`. The
//! collector records one path per discovered reference; substitution writes
//! the placeholder back through the same path.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::{ResolveError, ResolveResult};
use crate::value::Value;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field of a map or record.
    Field(SmolStr),
    /// A position in a list.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, "{}", name),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A dotted location inside a nested tree.
///
/// # Example
///
/// ```rust
/// use espalier_resolve::Path;
///
/// let path: Path = "children.2.owner".parse().unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.to_string(), "children.2.owner");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: SmallVec<[Segment; 4]>,
}

impl Path {
    /// The empty path, addressing the tree root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path string. The empty string is the root path.
    ///
    /// All-digit segments become list indices, so field names made only of
    /// digits cannot be addressed; declared field names are identifiers, so
    /// this does not arise in practice.
    pub fn parse(input: &str) -> ResolveResult<Path> {
        if input.is_empty() {
            return Ok(Path::root());
        }
        let mut segments = SmallVec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(ResolveError::invalid_path(format!(
                    "empty segment in {:?}",
                    input
                )));
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part.parse::<usize>().map_err(|_| {
                    ResolveError::invalid_path(format!("index out of range in {:?}", input))
                })?;
                segments.push(Segment::Index(index));
            } else {
                segments.push(Segment::Field(SmolStr::new(part)));
            }
        }
        Ok(Path { segments })
    }

    /// Append a field segment.
    pub fn push_field(&mut self, name: impl Into<SmolStr>) {
        self.segments.push(Segment::Field(name.into()));
    }

    /// Append an index segment.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    /// Remove the last segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// A new path with a field segment appended.
    pub fn child_field(&self, name: impl Into<SmolStr>) -> Path {
        let mut child = self.clone();
        child.push_field(name);
        child
    }

    /// A new path with an index segment appended.
    pub fn child_index(&self, index: usize) -> Path {
        let mut child = self.clone();
        child.push_index(index);
        child
    }

    /// The segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Read the value this path points at inside `root`.
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        let mut node = root;
        for segment in &self.segments {
            node = match segment {
                Segment::Field(name) => node.get(name)?,
                Segment::Index(index) => node.get_index(*index)?,
            };
        }
        Some(node)
    }

    /// Overwrite the value this path points at inside `root`.
    ///
    /// Only existing locations are written; returns `false` if any segment
    /// does not exist. Writing through an inline record clones the record if
    /// it is shared.
    pub fn set(&self, root: &mut Value, new: Value) -> bool {
        let Some((last, parents)) = self.segments.split_last() else {
            *root = new;
            return true;
        };

        let mut node = root;
        for segment in parents {
            node = match (segment, node) {
                (Segment::Field(name), Value::Map(entries)) => {
                    match entries.get_mut(name.as_str()) {
                        Some(next) => next,
                        None => return false,
                    }
                }
                (Segment::Field(name), Value::Record(record)) => {
                    match Arc::make_mut(record).get_mut(name) {
                        Some(next) => next,
                        None => return false,
                    }
                }
                (Segment::Index(index), Value::List(items)) => match items.get_mut(*index) {
                    Some(next) => next,
                    None => return false,
                },
                _ => return false,
            };
        }

        match (last, node) {
            (Segment::Field(name), Value::Map(entries)) => {
                match entries.get_mut(name.as_str()) {
                    Some(slot) => {
                        *slot = new;
                        true
                    }
                    None => false,
                }
            }
            (Segment::Field(name), Value::Record(record)) => {
                match Arc::make_mut(record).get_mut(name) {
                    Some(slot) => {
                        *slot = new;
                        true
                    }
                    None => false,
                }
            }
            (Segment::Index(index), Value::List(items)) => match items.get_mut(*index) {
                Some(slot) => {
                    *slot = new;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_and_display() {
        let path = Path::parse("children.2.owner").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(
            path.segments(),
            &[
                Segment::Field(SmolStr::new("children")),
                Segment::Index(2),
                Segment::Field(SmolStr::new("owner")),
            ]
        );
        assert_eq!(path.to_string(), "children.2.owner");
    }

    #[test]
    fn test_parse_root() {
        let path = Path::parse("").unwrap();
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn test_parse_normalizes_indices() {
        // Leading zeros parse as the same index and re-display normalized.
        let path = Path::parse("items.007").unwrap();
        assert_eq!(path.segments()[1], Segment::Index(7));
        assert_eq!(path.to_string(), "items.7");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(Path::parse(".owner").unwrap_err().is_schema_error());
        assert!(Path::parse("owner.").is_err());
        assert!(Path::parse("a..b").is_err());
    }

    #[test]
    fn test_from_str() {
        let path: Path = "address.country".parse().unwrap();
        assert_eq!(path.len(), 2);
    }

    // ==================== Build Tests ====================

    #[test]
    fn test_push_and_pop() {
        let mut path = Path::root();
        path.push_field("children");
        path.push_index(2);
        path.push_field("owner");
        assert_eq!(path.to_string(), "children.2.owner");

        assert_eq!(path.pop(), Some(Segment::Field(SmolStr::new("owner"))));
        assert_eq!(path.to_string(), "children.2");
    }

    #[test]
    fn test_child_builders() {
        let base = Path::root().child_field("children");
        let a = base.child_index(0).child_field("owner");
        let b = base.child_index(1).child_field("owner");

        assert_eq!(a.to_string(), "children.0.owner");
        assert_eq!(b.to_string(), "children.1.owner");
        assert_eq!(base.to_string(), "children");
    }

    // ==================== Tree Access Tests ====================

    #[test]
    fn test_get() {
        let tree = Value::from(json!({
            "children": [{"owner": 5}, {"owner": 6}]
        }));

        let path = Path::parse("children.1.owner").unwrap();
        assert_eq!(path.get(&tree), Some(&Value::Int(6)));

        assert_eq!(Path::parse("children.9.owner").unwrap().get(&tree), None);
        assert_eq!(Path::parse("missing").unwrap().get(&tree), None);
        assert!(Path::root().get(&tree).is_some());
    }

    #[test]
    fn test_set() {
        let mut tree = Value::from(json!({
            "children": [{"owner": 5}]
        }));

        let path = Path::parse("children.0.owner").unwrap();
        assert!(path.set(&mut tree, Value::from("replaced")));
        assert_eq!(path.get(&tree).unwrap().as_str(), Some("replaced"));
    }

    #[test]
    fn test_set_missing_location() {
        let mut tree = Value::from(json!({"a": 1}));
        assert!(!Path::parse("b").unwrap().set(&mut tree, Value::Null));
        assert!(!Path::parse("a.b").unwrap().set(&mut tree, Value::Null));
        assert_eq!(tree, Value::from(json!({"a": 1})));
    }

    #[test]
    fn test_set_root() {
        let mut tree = Value::from(json!({"a": 1}));
        assert!(Path::root().set(&mut tree, Value::Int(9)));
        assert_eq!(tree, Value::Int(9));
    }

    #[test]
    fn test_set_through_record() {
        let record = Record::new("User", 5).with_field("country", 9);
        let mut tree = Value::from(json!({"owner": null}));
        Path::parse("owner").unwrap().set(&mut tree, Value::from(record));

        let path = Path::parse("owner.country").unwrap();
        assert!(path.set(&mut tree, Value::from("substituted")));
        assert_eq!(path.get(&tree).unwrap().as_str(), Some("substituted"));
    }
}
