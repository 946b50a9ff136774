//! Execution-scoped value propagation.
//!
//! A [`Context`] is an immutable collection of values that travels with a unit
//! of work: application state keyed by type, plus the marker identifying the
//! span that is currently active, if any. Write operations never mutate in
//! place; they return a new `Context` sharing the unchanged entries.

use crate::trace::SpanContext;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasherDefault, Hasher};
use std::sync::Arc;

/// An immutable, execution-scoped collection of values.
///
/// Concerns store and retrieve their state through [`get`] and [`with_value`]
/// using application-specific types as keys, which keeps independent concerns
/// from overwriting each other. The active span marker is carried in a
/// dedicated slot managed via [`with_active_span`].
///
/// [`get`]: Context::get()
/// [`with_value`]: Context::with_value()
/// [`with_active_span`]: Context::with_active_span()
///
/// # Examples
///
/// ```
/// use tracekit::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct Deadline(u64);
///
/// let cx = Context::new();
/// let cx_with_deadline = cx.with_value(Deadline(120));
///
/// // the original context is unchanged
/// assert_eq!(cx.get::<Deadline>(), None);
/// assert_eq!(cx_with_deadline.get::<Deadline>(), Some(&Deadline(120)));
/// ```
#[derive(Clone, Default)]
pub struct Context {
    span: Option<Arc<SpanContext>>,
    entries: Option<Arc<EntryMap>>,
}

type EntryMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>, BuildHasherDefault<IdHasher>>;

impl Context {
    /// Creates an empty `Context`.
    ///
    /// The context is created with no entries and will not allocate until a
    /// value is added.
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns a reference to the entry for the corresponding value type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .as_ref()?
            .get(&TypeId::of::<T>())?
            .downcast_ref()
    }

    /// Returns a copy of the context with the new value included.
    pub fn with_value<T: 'static + Send + Sync>(&self, value: T) -> Self {
        let entries = match &self.entries {
            Some(current) => {
                let mut inner = (**current).clone();
                inner.insert(TypeId::of::<T>(), Arc::new(value));
                Some(Arc::new(inner))
            }
            None => {
                let mut entries = EntryMap::default();
                entries.insert(TypeId::of::<T>(), Arc::new(value));
                Some(Arc::new(entries))
            }
        };
        Context {
            span: self.span.clone(),
            entries,
        }
    }

    /// Returns a copy of the context with the given span installed as the
    /// active span marker, replacing any previous marker.
    pub fn with_active_span(&self, span_context: SpanContext) -> Self {
        Context {
            span: Some(Arc::new(span_context)),
            entries: self.entries.clone(),
        }
    }

    /// The active span marker, if one has been installed.
    pub fn active_span(&self) -> Option<&SpanContext> {
        self.span.as_deref()
    }

    /// Returns whether an active span marker has been installed.
    pub fn has_active_span(&self) -> bool {
        self.span.is_some()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.as_ref().map_or(0, |e| e.len());
        let mut dbg = f.debug_struct("Context");
        match &self.span {
            Some(span) => dbg.field("span", span),
            None => dbg.field("span", &"None"),
        };
        dbg.field("entries", &entries).finish()
    }
}

/// `TypeId` is already a compiler-produced hash; pass its u64 straight
/// through instead of hashing it a second time.
#[derive(Clone, Default, Debug)]
struct IdHasher(u64);

impl Hasher for IdHasher {
    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId calls write_u64");
    }

    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 = id;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}
