//! Scoped span-context management for distributed-tracing clients.
//!
//! This crate is the active-span tracking core of a tracing client: it lets
//! concurrently-running units of work each see a correct, isolated notion of
//! "the span currently in progress", nest new spans under it, suppress
//! tracing for sub-computations, and join or propagate trace context across
//! process boundaries through a carrier such as HTTP headers.
//!
//! # Components
//!
//! - [`Context`]: an immutable, execution-scoped collection of values
//!   carrying the active-span marker.
//! - [`Scope`] and [`ScopeManager`]: the current tracing state
//!   (root / span / suppressed) per unit of work, with entry operations
//!   whose [`ScopeGuard`]s restore the exact prior state on every exit
//!   path.
//! - [`Tracer`]: the facade composing the scope manager with a
//!   [`SpanRegistry`](trace::SpanRegistry) and a
//!   [`TextMapPropagator`](propagation::TextMapPropagator).
//!
//! What this crate deliberately does not do: record span attributes or
//! events, make sampling decisions, export anything, or define a wire
//! format. Those belong to the span creation, processing, and propagator
//! layers built on top.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tracekit::propagation::NoopTextMapPropagator;
//! use tracekit::trace::ActiveSpanRegistry;
//! use tracekit::{Context, Tracer};
//!
//! let tracer = Tracer::new(
//!     Context::new(),
//!     Arc::new(ActiveSpanRegistry::new()),
//!     Arc::new(NoopTextMapPropagator::new()),
//! );
//!
//! // Suppress tracing for a sub-computation, e.g. an exporter's own
//! // network calls.
//! tracer.noop_scope(|| {
//!     assert!(tracer.current_span_context().is_none());
//!     assert!(!tracer.current_span().is_recording());
//! });
//! ```
//!
//! # Concurrency
//!
//! Each thread owns its scope state exclusively; no cross-task locking is
//! involved. Futures carry a snapshot of their creator's scope via
//! [`scope::FutureScopeExt::with_scope`], which keeps sibling tasks and
//! their parent fully isolated from each other's scope changes.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod context;
pub mod propagation;
pub mod scope;
pub mod trace;

mod internal_logging;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::Context;
pub use scope::{Scope, ScopeGuard, ScopeManager};
pub use trace::{Span, SpanContext, SpanHandle, SpanId, TraceFlags, TraceId, Tracer};

#[cfg(feature = "internal-logs")]
#[doc(hidden)]
pub mod _private {
    pub use tracing::{debug, warn};
}
