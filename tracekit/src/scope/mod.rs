//! Tracking of the currently active tracing scope.
//!
//! Every independently-scheduled unit of work sees its own notion of "the
//! span currently in progress", held as a [`Scope`] in a per-thread cell.
//! The [`ScopeManager`] reads and replaces the current scope with guaranteed
//! restoration: each entry saves the exact prior state and the returned
//! [`ScopeGuard`] writes that saved state back when dropped, on every exit
//! path: normal return, panic unwind, or future cancellation.
//!
//! Forked units of work are isolated from each other: a new thread starts
//! with an empty cell (reading the manager's root baseline), and futures
//! carry a snapshot of their creator's scope via
//! [`with_scope`](FutureScopeExt::with_scope), attached only while they are
//! being polled. Mutating the scope in one unit of work is never visible in
//! another.

use crate::context::Context;
use crate::trace::{SpanContext, SpanHandle};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;


#[cfg(feature = "futures")]
mod future_ext;

#[cfg(feature = "futures")]
pub use future_ext::{FutureScopeExt, SinkScopeExt, StreamScopeExt, WithScope};

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Scope>> = const { RefCell::new(None) };
}

/// The ambient tracing state of the calling unit of work.
#[derive(Clone, Debug)]
pub enum Scope {
    /// The clean baseline: no span active, carrying the context the manager
    /// was created with.
    Root(Context),
    /// A span is active. Carries the context after installing the span, the
    /// span handle itself, and its identity.
    Span {
        /// The context with the span installed as its active-span marker.
        context: Context,
        /// The handle the scope was entered with.
        span: SpanHandle,
        /// The identity of `span`.
        span_context: SpanContext,
    },
    /// Tracing is suppressed: nothing records, nothing propagates.
    Noop,
}

impl Scope {
    /// The context carried by this scope, if it carries one.
    pub fn context(&self) -> Option<&Context> {
        match self {
            Scope::Root(cx) | Scope::Span { context: cx, .. } => Some(cx),
            Scope::Noop => None,
        }
    }

    /// The identity of the active span, if a span is active.
    pub fn span_context(&self) -> Option<&SpanContext> {
        match self {
            Scope::Span { span_context, .. } => Some(span_context),
            _ => None,
        }
    }

    /// Returns `true` if this scope suppresses tracing.
    pub fn is_noop(&self) -> bool {
        matches!(self, Scope::Noop)
    }

    /// Installs this scope as the calling thread's current scope.
    ///
    /// Dropping the returned [`ScopeGuard`] restores the state the cell held
    /// immediately before this call. Note that a variable name other than
    /// `_` is required to keep the guard alive:
    ///
    /// ```
    /// use tracekit::{Context, Scope};
    ///
    /// let _guard = Scope::Root(Context::new()).attach();
    /// ```
    pub fn attach(self) -> ScopeGuard {
        let previous = CURRENT_SCOPE
            .try_with(|cell| cell.replace(Some(self)))
            .ok();

        ScopeGuard {
            previous,
            _marker: PhantomData,
        }
    }
}

/// Reads and replaces the calling unit of work's current [`Scope`].
///
/// The manager is cheap to clone; all clones share the same immutable root
/// baseline. Scope state itself lives in per-thread cells, so no cross-task
/// synchronization happens on any of these operations.
#[derive(Clone, Debug)]
pub struct ScopeManager {
    base: Arc<Context>,
}

impl ScopeManager {
    /// Create a manager whose [`Scope::Root`] carries `base_context`.
    ///
    /// The baseline is captured once here and never changes afterwards.
    pub fn new(base_context: Context) -> Self {
        ScopeManager {
            base: Arc::new(base_context),
        }
    }

    /// The immutable baseline context captured at construction.
    pub fn base_context(&self) -> &Context {
        &self.base
    }

    /// The clean root scope. Pure; never touches the current state.
    pub fn root(&self) -> Scope {
        Scope::Root((*self.base).clone())
    }

    /// The calling unit of work's current scope.
    ///
    /// A unit of work that has installed nothing yet is at the root.
    pub fn current(&self) -> Scope {
        CURRENT_SCOPE
            .with(|cell| cell.borrow().clone())
            .unwrap_or_else(|| self.root())
    }

    /// Enter a scope with `span` installed over the current context.
    ///
    /// While the current scope is [`Scope::Noop`], suppression is sticky:
    /// entering a span yields `Noop` again rather than silently starting to
    /// record.
    pub fn enter_span(&self, span: SpanHandle) -> ScopeGuard {
        let next = match self.current() {
            Scope::Noop => Scope::Noop,
            Scope::Root(cx) | Scope::Span { context: cx, .. } => {
                let span_context = span.span_context().clone();
                Scope::Span {
                    context: cx.with_active_span(span_context.clone()),
                    span,
                    span_context,
                }
            }
        };
        next.attach()
    }

    /// Enter the clean root scope, detaching from any active span.
    ///
    /// Suppression survives re-rooting: when the current scope is
    /// [`Scope::Noop`], the entered scope is `Noop`, not `Root`.
    pub fn enter_root(&self) -> ScopeGuard {
        let next = match self.current() {
            Scope::Noop => Scope::Noop,
            _ => self.root(),
        };
        next.attach()
    }

    /// Enter the suppressed scope, unconditionally.
    ///
    /// Used to keep a sub-computation from producing telemetry about itself,
    /// e.g. an exporter's own network calls.
    pub fn enter_noop(&self) -> ScopeGuard {
        Scope::Noop.attach()
    }
}

/// Restores the scope saved at entry when dropped.
///
/// The guard records the exact cell state observed when the scope was
/// attached and writes that saved value back on drop. It never consults the
/// then-current state, so a sibling unit of work mutating its own cell in
/// the meantime cannot influence restoration.
#[derive(Debug)]
pub struct ScopeGuard {
    previous: Option<Option<Scope>>,
    // Scope cells are thread-local; the guard must restore on the thread
    // that attached.
    _marker: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.previous.take() {
            let _ = CURRENT_SCOPE.try_with(|cell| {
                *cell.borrow_mut() = saved;
            });
        }
    }
}
