//! Lazy placeholders: deferred lookups resolved from cache or store.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::cache::BatchCache;
use crate::error::{ResolveError, ResolveResult};
use crate::record::{Key, Record};
use crate::traits::EntityStore;

// ============================================================================
// Key Spec
// ============================================================================

/// The key(s) a placeholder stands for.
///
/// A single-reference field holds one key; a reference collection holds an
/// ordered list, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySpec {
    /// One key for a single-reference field.
    One(Key),
    /// An ordered key list for a reference collection.
    Many(Vec<Key>),
}

impl KeySpec {
    /// Number of key occurrences, duplicates counted.
    pub fn len(&self) -> usize {
        match self {
            KeySpec::One(_) => 1,
            KeySpec::Many(keys) => keys.len(),
        }
    }

    /// Whether this spec holds no keys (only possible for an empty list).
    pub fn is_empty(&self) -> bool {
        matches!(self, KeySpec::Many(keys) if keys.is_empty())
    }
}

// ============================================================================
// Lazy Value
// ============================================================================

/// A placeholder for one or more records of a single entity type.
///
/// Substituted into validated data during cache building and collapsed back
/// to records on demand. Retrieval consults the cache the placeholder was
/// built against; whatever the cache is missing is fetched from the store in
/// a single batch and merged in original key order.
#[derive(Clone)]
pub struct LazyValue {
    cache: Arc<BatchCache>,
    entity: SmolStr,
    keys: KeySpec,
}

/// Result of collapsing a placeholder, mirroring its arity.
#[derive(Debug, Clone, PartialEq)]
pub enum LazyResolved {
    /// A single record.
    One(Arc<Record>),
    /// Records in the placeholder's key order, duplicates included.
    Many(Vec<Arc<Record>>),
}

impl LazyValue {
    /// Placeholder for a single key.
    pub fn single(cache: Arc<BatchCache>, entity: impl Into<SmolStr>, key: Key) -> Self {
        Self {
            cache,
            entity: entity.into(),
            keys: KeySpec::One(key),
        }
    }

    /// Placeholder for an ordered key list.
    pub fn many(cache: Arc<BatchCache>, entity: impl Into<SmolStr>, keys: Vec<Key>) -> Self {
        Self {
            cache,
            entity: entity.into(),
            keys: KeySpec::Many(keys),
        }
    }

    /// The entity type this placeholder points at.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The key(s) this placeholder stands for.
    pub fn keys(&self) -> &KeySpec {
        &self.keys
    }

    /// Whether this placeholder stands for a key list.
    pub fn is_many(&self) -> bool {
        matches!(self.keys, KeySpec::Many(_))
    }

    /// Collapse this placeholder to its record(s).
    ///
    /// Cached records are served as-is. For a key list, every missing key is
    /// gathered into one deduplicated batch fetch and the results are merged
    /// back in the original order. A key absent from both cache and store is
    /// a [`ResolveError::not_found`] error.
    pub async fn retrieve(&self, store: &dyn EntityStore) -> ResolveResult<LazyResolved> {
        match &self.keys {
            KeySpec::One(key) => {
                if let Some(record) = self.cache.get_one(&self.entity, key) {
                    tracing::trace!(entity = %self.entity, key = %key, "lazy hit");
                    return Ok(LazyResolved::One(record));
                }
                tracing::trace!(entity = %self.entity, key = %key, "lazy miss, direct fetch");
                let record = store.fetch_one(&self.entity, key).await?;
                Ok(LazyResolved::One(record))
            }
            KeySpec::Many(keys) => {
                let cached = self.cache.entries(&self.entity);
                let mut missing: IndexSet<Key> = IndexSet::new();
                let mut hits = 0u64;
                for key in keys {
                    if cached.contains_key(key) {
                        hits += 1;
                    } else {
                        missing.insert(key.clone());
                    }
                }
                self.cache.note_hits(hits);
                self.cache.note_misses((keys.len() as u64) - hits);

                let fetched = if missing.is_empty() {
                    HashMap::new()
                } else {
                    tracing::trace!(
                        entity = %self.entity,
                        missing = missing.len(),
                        total = keys.len(),
                        "lazy list miss, batch fetch"
                    );
                    let wanted: Vec<Key> = missing.into_iter().collect();
                    store.fetch_by_keys(&self.entity, &wanted).await?
                };

                let records = merge_ordered(&self.entity, keys, &cached, &fetched)?;
                Ok(LazyResolved::Many(records))
            }
        }
    }
}

/// Assemble records for `keys` in order, preferring `primary` over `fetched`.
///
/// Duplicated keys yield the same record more than once. A key absent from
/// both maps fails the whole merge.
pub(crate) fn merge_ordered(
    entity: &str,
    keys: &[Key],
    primary: &HashMap<Key, Arc<Record>>,
    fetched: &HashMap<Key, Arc<Record>>,
) -> ResolveResult<Vec<Arc<Record>>> {
    keys.iter()
        .map(|key| {
            primary
                .get(key)
                .or_else(|| fetched.get(key))
                .cloned()
                .ok_or_else(|| ResolveError::not_found(entity, key))
        })
        .collect()
}

impl PartialEq for LazyValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cache, &other.cache)
            && self.entity == other.entity
            && self.keys == other.keys
    }
}

impl std::fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyValue")
            .field("entity", &self.entity)
            .field("keys", &self.keys)
            .finish()
    }
}
