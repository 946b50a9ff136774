//! Span identity, span handles, and the tracer facade.
//!
//! A trace is a tree of spans that tracks one request across the services
//! that handle it. This module provides the identity types ([`TraceId`],
//! [`SpanId`], [`SpanContext`]), the [`SpanHandle`] abstraction over live and
//! non-recording spans, the [`SpanRegistry`] lookup capability, and the
//! [`Tracer`] facade that ties span resolution and propagation to the
//! ambient [`Scope`].
//!
//! [`Scope`]: crate::scope::Scope

use std::num::ParseIntError;
use thiserror::Error;

mod registry;
mod span;
mod span_context;
mod tracer;

pub use registry::{ActiveSpanRegistry, SpanRegistry};
pub use span::{Span, SpanHandle};
pub use span_context::{SpanContext, SpanId, TraceFlags, TraceId};
pub use tracer::{SpanBuilder, Tracer};

/// Errors returned by trace identity parsing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// The identifier was not a valid base16 string.
    #[error("identifier is not valid hex: {0}")]
    InvalidId(#[from] ParseIntError),

    /// Other errors propagated from tracing collaborators.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}
