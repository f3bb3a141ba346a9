//! Structured fuzzing for path access over nested trees.
//!
//! This target generates tree values and paths using the `arbitrary` crate
//! and checks that reads and writes agree about which locations exist.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_path_structured
//! ```

#![no_main]

use arbitrary::Arbitrary;
use espalier_resolve::path::Path;
use espalier_resolve::value::Value;
use libfuzzer_sys::fuzz_target;

/// A generated tree node.
#[derive(Debug, Arbitrary)]
enum FuzzNode {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<FuzzNode>),
    Map(Vec<(String, FuzzNode)>),
}

impl FuzzNode {
    fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Text(s) => Value::String(s.as_str().into()),
            Self::List(items) => Value::List(items.iter().map(Self::to_value).collect()),
            Self::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_str().into(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

/// A generated path segment.
#[derive(Debug, Arbitrary)]
enum FuzzSegment {
    Field(String),
    Index(u8),
}

#[derive(Debug, Arbitrary)]
struct FuzzCase {
    tree: FuzzNode,
    segments: Vec<FuzzSegment>,
}

fuzz_target!(|case: FuzzCase| {
    let mut tree = case.tree.to_value();

    let mut path = Path::root();
    for segment in &case.segments {
        match segment {
            FuzzSegment::Field(name) => path.push_field(name.as_str()),
            FuzzSegment::Index(index) => path.push_index(*index as usize),
        }
    }

    // A location that reads must also write, and vice versa.
    let exists = path.get(&tree).is_some();
    let written = path.set(&mut tree, Value::Int(0));
    assert_eq!(exists, written);
    if written {
        assert_eq!(path.get(&tree), Some(&Value::Int(0)));
    }
});
