use crate::propagation::{Extractor, Injector, TextMapPropagator};
use crate::scope::{Scope, ScopeGuard, ScopeManager};
use crate::trace::{SpanContext, SpanHandle, SpanRegistry};
use crate::Context;
use std::borrow::Cow;
use std::sync::Arc;

/// The entry point for span resolution, scoped span entry, and context
/// propagation.
///
/// A `Tracer` composes a [`ScopeManager`] with two collaborators: a
/// [`SpanRegistry`] resolving locally-created spans to live handles, and a
/// [`TextMapPropagator`] moving context across process boundaries. It is
/// cheap to clone and safe to share across tasks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tracekit::propagation::NoopTextMapPropagator;
/// use tracekit::trace::ActiveSpanRegistry;
/// use tracekit::{Context, Tracer};
///
/// let tracer = Tracer::new(
///     Context::new(),
///     Arc::new(ActiveSpanRegistry::new()),
///     Arc::new(NoopTextMapPropagator::new()),
/// );
///
/// // no span has been entered yet
/// assert!(tracer.current_span_context().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct Tracer {
    scopes: ScopeManager,
    registry: Arc<dyn SpanRegistry + Send + Sync>,
    propagator: Arc<dyn TextMapPropagator + Send + Sync>,
}

impl Tracer {
    /// Create a tracer rooted at `base_context`.
    pub fn new(
        base_context: Context,
        registry: Arc<dyn SpanRegistry + Send + Sync>,
        propagator: Arc<dyn TextMapPropagator + Send + Sync>,
    ) -> Self {
        Tracer {
            scopes: ScopeManager::new(base_context),
            registry,
            propagator,
        }
    }

    /// The scope manager backing this tracer.
    pub fn scope_manager(&self) -> &ScopeManager {
        &self.scopes
    }

    /// The identity of the currently active span, if a valid one is active.
    ///
    /// Returns `None` at the root, under suppression, and for an active span
    /// whose context is invalid.
    pub fn current_span_context(&self) -> Option<SpanContext> {
        match self.scopes.current() {
            Scope::Span { span_context, .. } if span_context.is_valid() => Some(span_context),
            _ => None,
        }
    }

    /// The currently active span, never failing.
    ///
    /// Resolution degrades in two steps: a locally-created span resolves
    /// through the registry to its live handle; a valid span context the
    /// registry does not know (it arrived via remote propagation, or the
    /// span already ended) yields a propagating-only handle that still
    /// carries the identity forward; no valid span context at all yields a
    /// pure no-op handle.
    pub fn current_span(&self) -> SpanHandle {
        match self.current_span_context() {
            Some(sc) => self
                .registry
                .lookup(&sc)
                .unwrap_or_else(|| SpanHandle::propagating(sc)),
            None => SpanHandle::noop(),
        }
    }

    /// Start describing a span with the given name.
    ///
    /// The builder captures its parent linkage from the current scope at
    /// this moment; building the span itself belongs to the span creation
    /// layer.
    pub fn span_builder<T>(&self, name: T) -> SpanBuilder
    where
        T: Into<Cow<'static, str>>,
    {
        SpanBuilder {
            name: name.into(),
            parent: self.current_span_context(),
        }
    }

    /// Enter a scope with `span` active, restoring the prior scope when the
    /// returned guard drops.
    ///
    /// See [`ScopeManager::enter_span`] for the suppression rules.
    #[must_use = "dropping the guard immediately restores the prior scope"]
    pub fn enter_span(&self, span: SpanHandle) -> ScopeGuard {
        self.scopes.enter_span(span)
    }

    /// Run `f` with `span` active.
    pub fn with_span<F, R>(&self, span: SpanHandle, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.scopes.enter_span(span);
        f()
    }

    /// Run `f` with `parent` installed as the active span context, without
    /// resolving or creating a span handle.
    ///
    /// This is pure context installation, useful for processing work on
    /// behalf of a span identified only by its context. Suppression is
    /// sticky here as it is for [`with_span`](Tracer::with_span).
    pub fn child_scope<F, R>(&self, parent: SpanContext, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let next = match self.scopes.current() {
            Scope::Noop => Scope::Noop,
            Scope::Root(cx) | Scope::Span { context: cx, .. } => Scope::Span {
                context: cx.with_active_span(parent.clone()),
                span: SpanHandle::propagating(parent.clone()),
                span_context: parent,
            },
        };
        let _guard = next.attach();
        f()
    }

    /// Run `f` detached from any active span, at the clean root.
    pub fn root_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.scopes.enter_root();
        f()
    }

    /// Run `f` with tracing suppressed.
    pub fn noop_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.scopes.enter_noop();
        f()
    }

    /// Join the trace carried by `extractor`, or start from the clean root.
    ///
    /// Extraction always starts from the root baseline, never from the
    /// ambient current scope, so local state cannot leak into a freshly
    /// joined remote trace. When the carrier yields a valid span context,
    /// `f` runs with the extracted context installed; otherwise this is
    /// exactly [`root_scope`](Tracer::root_scope).
    pub fn join_or_root<F, R>(&self, extractor: &dyn Extractor, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let extracted = self
            .propagator
            .extract_with_context(self.scopes.base_context(), extractor);
        let joined = extracted
            .active_span()
            .filter(|sc| sc.is_valid())
            .cloned();
        match joined {
            Some(span_context) => {
                let scope = Scope::Span {
                    span: SpanHandle::propagating(span_context.clone()),
                    span_context,
                    context: extracted,
                };
                let _guard = scope.attach();
                f()
            }
            None => self.root_scope(f),
        }
    }

    /// Inject the current context into `injector`.
    ///
    /// A pure read: the current scope is never modified, and repeated calls
    /// without intervening scope changes write the same values. Under
    /// suppression nothing is injected.
    pub fn propagate(&self, injector: &mut dyn Injector) {
        match self.scopes.current() {
            Scope::Root(cx) | Scope::Span { context: cx, .. } => {
                self.propagator.inject_context(&cx, injector)
            }
            Scope::Noop => self.propagator.inject_context(&Context::new(), injector),
        }
    }
}

/// The data needed to start a span: its name and parent linkage.
///
/// Attribute and timing configuration belong to the span creation layer
/// consuming this builder.
#[derive(Clone, Debug)]
pub struct SpanBuilder {
    /// The span's name.
    pub name: Cow<'static, str>,
    /// The parent the span will be linked under, if any.
    pub parent: Option<SpanContext>,
}

impl SpanBuilder {
    /// Create a builder with no parent linkage.
    pub fn from_name<T>(name: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        SpanBuilder {
            name: name.into(),
            parent: None,
        }
    }

    /// Replace the parent linkage.
    pub fn with_parent(self, parent: Option<SpanContext>) -> Self {
        SpanBuilder { parent, ..self }
    }
}
