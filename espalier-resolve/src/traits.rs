//! Core traits: the persistence interface and the typed resolution walk.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use espalier_schema::Registry;

use crate::error::{ResolveError, ResolveResult};
use crate::record::{Key, Record};

/// Boxed future type used by [`Resolvable`] implementations.
pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;

// ============================================================================
// Entity Store
// ============================================================================

/// The persistence interface the pipeline fetches through.
///
/// The pipeline performs no I/O itself; every suspension point is a call
/// into this trait. Implementations batch however suits the backend; the
/// contract is one call per (entity type, key batch).
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch a batch of records by key.
    ///
    /// Keys absent from the backing store are simply absent from the result
    /// map; absence is surfaced as an error only where the reference is
    /// consumed. Errors from this method mean the store itself failed.
    async fn fetch_by_keys(
        &self,
        entity: &str,
        keys: &[Key],
    ) -> ResolveResult<HashMap<Key, Arc<Record>>>;

    /// Fetch a single record, failing if it does not exist.
    async fn fetch_one(&self, entity: &str, key: &Key) -> ResolveResult<Arc<Record>> {
        let mut found = self.fetch_by_keys(entity, std::slice::from_ref(key)).await?;
        found
            .remove(key)
            .ok_or_else(|| ResolveError::not_found(entity, key))
    }
}

// ============================================================================
// Resolution Context
// ============================================================================

/// Shared context handed to every step of the post-validation walk.
#[derive(Clone, Copy)]
pub struct ResolveCx<'a> {
    registry: &'a Registry,
    store: &'a dyn EntityStore,
}

impl<'a> ResolveCx<'a> {
    /// Create a context over a registry and a store.
    pub fn new(registry: &'a Registry, store: &'a dyn EntityStore) -> Self {
        Self { registry, store }
    }

    /// The schema registry.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// The backing store.
    pub fn store(&self) -> &'a dyn EntityStore {
        self.store
    }
}

impl std::fmt::Debug for ResolveCx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveCx")
            .field("entities", &self.registry.entity_count())
            .field("structures", &self.registry.structure_count())
            .finish()
    }
}

// ============================================================================
// Resolvable
// ============================================================================

/// A typed object whose reference slots can be collapsed to records.
///
/// Implementations resolve their own slots and recurse into nested
/// structured fields. `Vec<T>` and `Option<T>` forward element-wise.
///
/// # Example
///
/// ```rust,ignore
/// use espalier_resolve::{BoxFuture, Ref, Resolvable, ResolveCx, ResolveResult};
///
/// struct Article {
///     title: String,
///     owner: Ref,
/// }
///
/// impl Resolvable for Article {
///     fn resolve_refs<'a>(&'a mut self, cx: &'a ResolveCx<'a>) -> BoxFuture<'a, ResolveResult<()>> {
///         Box::pin(async move {
///             self.owner.resolve(cx).await?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Resolvable: Send {
    /// Replace every placeholder reachable from this object with its record.
    fn resolve_refs<'a>(&'a mut self, cx: &'a ResolveCx<'a>) -> BoxFuture<'a, ResolveResult<()>>;
}

impl<T: Resolvable> Resolvable for Vec<T> {
    fn resolve_refs<'a>(&'a mut self, cx: &'a ResolveCx<'a>) -> BoxFuture<'a, ResolveResult<()>> {
        Box::pin(async move {
            for item in self.iter_mut() {
                item.resolve_refs(cx).await?;
            }
            Ok(())
        })
    }
}

impl<T: Resolvable> Resolvable for Option<T> {
    fn resolve_refs<'a>(&'a mut self, cx: &'a ResolveCx<'a>) -> BoxFuture<'a, ResolveResult<()>> {
        Box::pin(async move {
            if let Some(item) = self.as_mut() {
                item.resolve_refs(cx).await?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espalier_schema::Registry;
    use pretty_assertions::assert_eq;

    struct MockStore;

    #[async_trait]
    impl EntityStore for MockStore {
        async fn fetch_by_keys(
            &self,
            entity: &str,
            keys: &[Key],
        ) -> ResolveResult<HashMap<Key, Arc<Record>>> {
            // Serves every key except 404.
            Ok(keys
                .iter()
                .filter(|key| **key != Key::Int(404))
                .map(|key| (key.clone(), Arc::new(Record::new(entity, key.clone()))))
                .collect())
        }
    }

    struct Probe {
        resolved: u32,
    }

    impl Resolvable for Probe {
        fn resolve_refs<'a>(
            &'a mut self,
            _cx: &'a ResolveCx<'a>,
        ) -> BoxFuture<'a, ResolveResult<()>> {
            Box::pin(async move {
                self.resolved += 1;
                Ok(())
            })
        }
    }

    fn empty_registry() -> Registry {
        Registry::builder().build().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_one_default_impl() {
        let store = MockStore;
        let record = store.fetch_one("User", &Key::Int(5)).await.unwrap();
        assert_eq!(record.entity(), "User");
        assert_eq!(record.key(), &Key::Int(5));
    }

    #[tokio::test]
    async fn test_fetch_one_not_found() {
        let store = MockStore;
        let err = store.fetch_one("User", &Key::Int(404)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_vec_resolves_each_element() {
        let registry = empty_registry();
        let store = MockStore;
        let cx = ResolveCx::new(&registry, &store);

        let mut items = vec![Probe { resolved: 0 }, Probe { resolved: 0 }];
        items.resolve_refs(&cx).await.unwrap();
        assert_eq!(items[0].resolved, 1);
        assert_eq!(items[1].resolved, 1);
    }

    #[tokio::test]
    async fn test_option_resolves_some() {
        let registry = empty_registry();
        let store = MockStore;
        let cx = ResolveCx::new(&registry, &store);

        let mut present = Some(Probe { resolved: 0 });
        present.resolve_refs(&cx).await.unwrap();
        assert_eq!(present.unwrap().resolved, 1);

        let mut absent: Option<Probe> = None;
        assert!(absent.resolve_refs(&cx).await.is_ok());
    }

    #[test]
    fn test_cx_debug() {
        let registry = empty_registry();
        let store = MockStore;
        let cx = ResolveCx::new(&registry, &store);
        let debug = format!("{:?}", cx);
        assert!(debug.contains("ResolveCx"));
    }
}
