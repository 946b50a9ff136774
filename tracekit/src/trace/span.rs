use crate::trace::SpanContext;
use std::fmt;
use std::sync::Arc;

/// The interface a live span exposes to the scope-tracking core.
///
/// Span construction, attribute recording, and lifecycle management belong to
/// the span builder and processing layers; the core only needs to know a
/// span's identity and whether it records.
pub trait Span: fmt::Debug {
    /// A reference to the [`SpanContext`] identifying this span.
    fn span_context(&self) -> &SpanContext;

    /// Returns `true` if this span is recording information.
    fn is_recording(&self) -> bool;
}

/// A cheaply cloneable, shareable handle to a span.
///
/// Three kinds of handle exist, distinguished by where the span came from:
///
/// - a live handle over a locally-created span ([`SpanHandle::new`]),
/// - a propagating-only handle for a span known about via remote
///   propagation: non-recording, but it still carries the [`SpanContext`]
///   forward so later injection re-emits it ([`SpanHandle::propagating`]),
/// - a pure no-op handle: non-recording with nothing to propagate
///   ([`SpanHandle::noop`]).
#[derive(Clone, Debug)]
pub struct SpanHandle(Arc<dyn Span + Send + Sync>);

impl SpanHandle {
    /// Wrap a live span in a shared handle.
    pub fn new<S>(span: S) -> Self
    where
        S: Span + Send + Sync + 'static,
    {
        SpanHandle(Arc::new(span))
    }

    /// A non-recording handle with an invalid span context.
    pub fn noop() -> Self {
        SpanHandle(Arc::new(NonRecordingSpan {
            span_context: SpanContext::NONE,
        }))
    }

    /// A non-recording handle that carries `span_context` forward for
    /// propagation.
    pub fn propagating(span_context: SpanContext) -> Self {
        SpanHandle(Arc::new(NonRecordingSpan { span_context }))
    }

    /// A reference to the [`SpanContext`] of the underlying span.
    pub fn span_context(&self) -> &SpanContext {
        self.0.span_context()
    }

    /// Returns `true` if the underlying span is recording information.
    pub fn is_recording(&self) -> bool {
        self.0.is_recording()
    }
}

/// Backs the no-op and propagating-only handle variants; the two differ only
/// in whether the carried span context is valid.
#[derive(Clone, Debug)]
struct NonRecordingSpan {
    span_context: SpanContext,
}

impl Span for NonRecordingSpan {
    fn span_context(&self) -> &SpanContext {
        &self.span_context
    }

    fn is_recording(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{SpanId, TraceFlags, TraceId};

    #[test]
    fn noop_handle_has_invalid_context() {
        let handle = SpanHandle::noop();
        assert!(!handle.is_recording());
        assert!(!handle.span_context().is_valid());
    }

    #[test]
    fn propagating_handle_keeps_identity() {
        let sc = SpanContext::new(
            TraceId::from_u128(7),
            SpanId::from_u64(8),
            TraceFlags::SAMPLED,
            true,
        );
        let handle = SpanHandle::propagating(sc.clone());
        assert!(!handle.is_recording());
        assert_eq!(handle.span_context(), &sc);
    }

    #[test]
    fn handles_share_the_underlying_span() {
        let sc = SpanContext::new(
            TraceId::from_u128(1),
            SpanId::from_u64(2),
            TraceFlags::default(),
            false,
        );
        let handle = SpanHandle::propagating(sc.clone());
        let cloned = handle.clone();
        assert_eq!(handle.span_context(), cloned.span_context());
    }
}
