//! Utilities for testing tracing instrumentation.

use crate::trace::{Span, SpanContext};

/// A minimal recording span identified by the context it wraps.
#[derive(Clone, Debug)]
pub struct TestSpan(pub SpanContext);

impl Span for TestSpan {
    fn span_context(&self) -> &SpanContext {
        &self.0
    }

    fn is_recording(&self) -> bool {
        true
    }
}
