use crate::propagation::{Extractor, Injector};
use crate::Context;
use std::fmt::Debug;
use std::slice;

/// Injects and extracts [`Context`] state as string key/value pairs.
///
/// Implementations own their wire format completely. Extraction must degrade
/// gracefully: a malformed carrier yields the passed-in context unchanged,
/// never an error to the caller.
pub trait TextMapPropagator: Debug {
    /// Encode the given context's values into the carrier.
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector);

    /// Decode a context from the carrier, layered over `cx`.
    ///
    /// Returns `cx` unchanged when the carrier holds nothing usable.
    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context;

    /// The carrier keys this propagator reads and writes.
    fn fields(&self) -> FieldIter<'_>;
}

/// An iterator over the carrier field names a propagator uses.
#[derive(Debug)]
pub struct FieldIter<'a>(slice::Iter<'a, String>);

impl<'a> FieldIter<'a> {
    /// Create a new `FieldIter` from a slice of field names.
    pub fn new(fields: &'a [String]) -> Self {
        FieldIter(fields.iter())
    }
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|field| field.as_str())
    }
}

/// A propagator that injects nothing and extracts nothing.
#[derive(Debug, Default)]
pub struct NoopTextMapPropagator {
    _private: (),
}

impl NoopTextMapPropagator {
    /// Create a new no-op propagator.
    pub fn new() -> Self {
        NoopTextMapPropagator { _private: () }
    }
}

impl TextMapPropagator for NoopTextMapPropagator {
    fn inject_context(&self, _cx: &Context, _injector: &mut dyn Injector) {
        // Ignored
    }

    fn extract_with_context(&self, cx: &Context, _extractor: &dyn Extractor) -> Context {
        cx.clone()
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(&[])
    }
}
