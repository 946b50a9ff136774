use crate::trace::{SpanContext, SpanHandle, SpanId, TraceId};
use crate::tracekit_warn;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Lookup of live, locally-created spans by identity.
///
/// Locally-started spans are resolvable for as long as they are registered;
/// span contexts that arrived via remote propagation were never registered
/// and resolve to `None`. "Not found" is a normal result, not an error: a
/// lookup racing a concurrent span end simply misses.
pub trait SpanRegistry: fmt::Debug {
    /// Resolve a span context to its live handle, if one is registered.
    fn lookup(&self, span_context: &SpanContext) -> Option<SpanHandle>;
}

/// A shared in-memory table of the spans currently in flight.
///
/// Span lifecycle code inserts a handle when a span starts and removes it
/// when the span ends; the tracer facade only ever reads. Safe for concurrent
/// use from any number of tasks.
#[derive(Debug, Default)]
pub struct ActiveSpanRegistry {
    spans: RwLock<HashMap<(TraceId, SpanId), SpanHandle>>,
}

impl ActiveSpanRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ActiveSpanRegistry::default()
    }

    /// Register a live span under its own identity.
    ///
    /// Handles with an invalid span context are ignored; there is nothing to
    /// look them up by.
    pub fn insert(&self, handle: SpanHandle) {
        let span_context = handle.span_context();
        if !span_context.is_valid() {
            return;
        }
        let key = (span_context.trace_id(), span_context.span_id());
        match self.spans.write() {
            Ok(mut spans) => {
                spans.insert(key, handle);
            }
            Err(_) => {
                tracekit_warn!(name: "ActiveSpanRegistry.LockPoisoned");
            }
        }
    }

    /// Remove the span registered under the given identity, if any.
    pub fn remove(&self, span_context: &SpanContext) {
        let key = (span_context.trace_id(), span_context.span_id());
        if let Ok(mut spans) = self.spans.write() {
            spans.remove(&key);
        } else {
            tracekit_warn!(name: "ActiveSpanRegistry.LockPoisoned");
        }
    }

    /// The number of spans currently registered.
    pub fn len(&self) -> usize {
        self.spans.read().map(|spans| spans.len()).unwrap_or(0)
    }

    /// Returns `true` if no spans are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpanRegistry for ActiveSpanRegistry {
    fn lookup(&self, span_context: &SpanContext) -> Option<SpanHandle> {
        let key = (span_context.trace_id(), span_context.span_id());
        match self.spans.read() {
            Ok(spans) => spans.get(&key).cloned(),
            // A poisoned table degrades to "not found" rather than failing
            // the caller.
            Err(_) => {
                tracekit_warn!(name: "ActiveSpanRegistry.LockPoisoned");
                None
            }
        }
    }
}
