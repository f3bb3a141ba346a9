//! The resolution engine: batched cache building and typed resolution.
//!
//! [`ResolveEngine::build_cache`] is the batching half of the pipeline. It
//! discovers every entity reference in a validated payload, fetches each
//! entity type's keys in one store round trip, and substitutes placeholders
//! at the discovered paths. [`ResolveEngine::fetch_cache`] is the typed
//! half: it walks a decoded host object and collapses every slot, serving
//! placeholders from the cache built moments before.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use indexmap::IndexSet;
use smol_str::SmolStr;

use espalier_schema::Registry;

use crate::adapter::ValidationHook;
use crate::cache::BatchCache;
use crate::collect::{CollectedRefs, Collector, KeyOrRecord, RefKeys};
use crate::config::ResolveOptions;
use crate::error::{ResolveError, ResolveResult};
use crate::lazy::LazyValue;
use crate::record::{Key, Record};
use crate::traits::{EntityStore, Resolvable, ResolveCx};
use crate::value::Value;

/// Resolves entity references in two phases against one store.
///
/// The engine is cheap to clone and safe to share across tasks; all state
/// lives in the registry, the store, and the caches its passes create.
#[derive(Clone)]
pub struct ResolveEngine {
    registry: Arc<Registry>,
    store: Arc<dyn EntityStore>,
    options: ResolveOptions,
}

impl ResolveEngine {
    /// Engine over a registry and store with default options.
    pub fn new(registry: Arc<Registry>, store: Arc<dyn EntityStore>) -> Self {
        Self {
            registry,
            store,
            options: ResolveOptions::default(),
        }
    }

    /// Replace this engine's options.
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// The schema registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The backing store.
    pub fn store(&self) -> &dyn EntityStore {
        &*self.store
    }

    /// This engine's options.
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// The cache a new pass will write into.
    fn cache_for_pass(&self) -> Arc<BatchCache> {
        if self.options.shared_cache {
            BatchCache::shared()
        } else {
            Arc::new(BatchCache::new())
        }
    }

    /// Discover, batch-fetch, and substitute every reference in `value`.
    ///
    /// `value` is a payload (or list of payloads) already validated against
    /// `struct_name`. Each referenced entity type costs at most one store
    /// round trip; keys the store cannot produce stay unresolved until the
    /// placeholder is consumed. With caching disabled the payload is left
    /// untouched.
    pub async fn build_cache(&self, struct_name: &str, value: &mut Value) -> ResolveResult<()> {
        if self.registry.structure(struct_name).is_none() {
            return Err(ResolveError::unknown_struct(struct_name));
        }
        if !self.options.cache_enabled {
            tracing::debug!(structure = struct_name, "cache building disabled");
            return Ok(());
        }

        let refs = Collector::new(&self.registry).collect(struct_name, value)?;
        if refs.is_empty() {
            return Ok(());
        }

        let cache = self.cache_for_pass();
        self.populate(&cache, &refs).await?;
        substitute(&cache, refs, value)
    }

    /// Fetch every missing key in `refs` into `cache`, one batch per entity.
    async fn populate(&self, cache: &BatchCache, refs: &CollectedRefs) -> ResolveResult<()> {
        let mut fetches = Vec::new();
        for (entity, tuples) in refs {
            let mut wanted: IndexSet<Key> = IndexSet::new();
            for tuple in tuples {
                match &tuple.keys {
                    RefKeys::One(elem) => seed_or_want(cache, entity, elem, &mut wanted),
                    RefKeys::Many(elems) => {
                        for elem in elems {
                            seed_or_want(cache, entity, elem, &mut wanted);
                        }
                    }
                }
            }

            let snapshot = cache.entries(entity);
            let missing: Vec<Key> = wanted
                .iter()
                .filter(|key| !snapshot.contains_key(*key))
                .cloned()
                .collect();
            cache.note_hits((wanted.len() - missing.len()) as u64);
            cache.note_misses(missing.len() as u64);

            if !missing.is_empty() {
                fetches.push(self.fetch_group(entity.clone(), missing));
            }
        }

        for (entity, records) in try_join_all(fetches).await? {
            cache.put_many(entity, records);
        }
        Ok(())
    }

    async fn fetch_group(
        &self,
        entity: SmolStr,
        keys: Vec<Key>,
    ) -> ResolveResult<(SmolStr, HashMap<Key, Arc<Record>>)> {
        tracing::debug!(entity = %entity, keys = keys.len(), "batch fetch");
        let records = self.store.fetch_by_keys(&entity, &keys).await?;
        Ok((entity, records))
    }

    /// Collapse every reference slot reachable from a decoded host object.
    pub async fn fetch_cache<T: Resolvable>(&self, target: &mut T) -> ResolveResult<()> {
        let cx = ResolveCx::new(&self.registry, &*self.store);
        target.resolve_refs(&cx).await
    }

    /// Run the whole pipeline through a validation hook.
    ///
    /// Builds the cache over `payload`, hands the substituted value to the
    /// hook's decoder, then collapses the decoded object's slots.
    pub async fn resolve_with<H: ValidationHook>(
        &self,
        hook: &H,
        payload: Value,
    ) -> ResolveResult<H::Output> {
        let mut value = payload;
        self.build_cache(hook.struct_name(), &mut value).await?;
        let mut output = hook.decode(&self.registry, value)?;
        self.fetch_cache(&mut output).await?;
        Ok(output)
    }
}

impl std::fmt::Debug for ResolveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveEngine")
            .field("entities", &self.registry.entity_count())
            .field("structures", &self.registry.structure_count())
            .field("options", &self.options)
            .finish()
    }
}

/// Seed an inline record into the cache, or mark a bare key as wanted.
fn seed_or_want(cache: &BatchCache, entity: &SmolStr, elem: &KeyOrRecord, wanted: &mut IndexSet<Key>) {
    match elem {
        KeyOrRecord::Key(key) => {
            wanted.insert(key.clone());
        }
        KeyOrRecord::Record(record) => {
            cache.put(entity.clone(), record.key().clone(), Arc::clone(record));
        }
    }
}

/// Replace every discovered reference with a placeholder bound to `cache`.
fn substitute(cache: &Arc<BatchCache>, refs: CollectedRefs, value: &mut Value) -> ResolveResult<()> {
    for (entity, tuples) in refs {
        for tuple in tuples {
            let lazy = match tuple.keys {
                RefKeys::One(elem) => {
                    LazyValue::single(Arc::clone(cache), entity.clone(), elem.key().clone())
                }
                RefKeys::Many(elems) => LazyValue::many(
                    Arc::clone(cache),
                    entity.clone(),
                    elems.iter().map(|elem| elem.key().clone()).collect(),
                ),
            };
            if !tuple.path.set(value, Value::Lazy(lazy)) {
                return Err(ResolveError::internal(format!(
                    "substitution target vanished at {}",
                    tuple.path
                )));
            }
        }
    }
    Ok(())
}
