//! Bridging substituted payloads into typed host objects.

use std::marker::PhantomData;

use smol_str::SmolStr;

use espalier_schema::Registry;

use crate::error::ResolveResult;
use crate::traits::Resolvable;
use crate::value::Value;

/// Decodes validated payloads for [`resolve_with`](crate::ResolveEngine::resolve_with).
///
/// A hook names the structure its payloads were validated against and turns
/// a substituted payload into a typed object. Decoding runs between the two
/// engine phases: reference fields still hold placeholders, and the engine
/// collapses the decoded object's slots immediately afterwards.
pub trait ValidationHook {
    /// The typed object this hook produces.
    type Output: Resolvable;

    /// The structure name payloads are validated against.
    fn struct_name(&self) -> &str;

    /// Decode a substituted payload into the typed output.
    fn decode(&self, registry: &Registry, value: Value) -> ResolveResult<Self::Output>;
}

/// A [`ValidationHook`] built from a decode closure.
pub struct FnHook<T, F> {
    struct_name: SmolStr,
    decode: F,
    _output: PhantomData<fn() -> T>,
}

impl<T, F> FnHook<T, F>
where
    T: Resolvable,
    F: Fn(&Registry, Value) -> ResolveResult<T>,
{
    /// Hook decoding payloads of `struct_name` with `decode`.
    pub fn new(struct_name: impl Into<SmolStr>, decode: F) -> Self {
        Self {
            struct_name: struct_name.into(),
            decode,
            _output: PhantomData,
        }
    }
}

impl<T, F> ValidationHook for FnHook<T, F>
where
    T: Resolvable,
    F: Fn(&Registry, Value) -> ResolveResult<T>,
{
    type Output = T;

    fn struct_name(&self) -> &str {
        &self.struct_name
    }

    fn decode(&self, registry: &Registry, value: Value) -> ResolveResult<T> {
        (self.decode)(registry, value)
    }
}

impl<T, F> std::fmt::Debug for FnHook<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHook")
            .field("struct_name", &self.struct_name)
            .finish()
    }
}
