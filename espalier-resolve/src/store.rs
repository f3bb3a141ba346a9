//! In-memory entity store with a fetch call log.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use smol_str::SmolStr;

use crate::error::ResolveResult;
use crate::record::{Key, Record};
use crate::traits::EntityStore;

/// One recorded [`EntityStore::fetch_by_keys`] invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    /// Entity type that was fetched.
    pub entity: SmolStr,
    /// Keys requested, in the order they were passed.
    pub keys: Vec<Key>,
}

/// An [`EntityStore`] backed by process memory.
///
/// Every fetch is appended to a call log, so tests can assert on batching
/// behavior: how many round trips happened and which keys each carried.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<SmolStr, HashMap<Key, Arc<Record>>>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any existing record with the same key.
    pub fn insert(&self, record: Record) {
        let entity = record.entity().into();
        let key = record.key().clone();
        self.records
            .write()
            .entry(entity)
            .or_default()
            .insert(key, Arc::new(record));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(self, record: Record) -> Self {
        self.insert(record);
        self
    }

    /// Add several records at once.
    pub fn extend(&self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Total number of records across all entity types.
    pub fn len(&self) -> usize {
        self.records.read().values().map(HashMap::len).sum()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Snapshot of the fetch log in issue order.
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    /// Clear the fetch log, keeping the records.
    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn fetch_by_keys(
        &self,
        entity: &str,
        keys: &[Key],
    ) -> ResolveResult<HashMap<Key, Arc<Record>>> {
        self.calls.lock().push(FetchCall {
            entity: entity.into(),
            keys: keys.to_vec(),
        });

        let records = self.records.read();
        let Some(table) = records.get(entity) else {
            return Ok(HashMap::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| table.get(key).map(|record| (key.clone(), Arc::clone(record))))
            .collect())
    }
}
