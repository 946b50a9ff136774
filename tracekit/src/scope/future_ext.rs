use crate::scope::Scope;
use futures_core::Stream;
use futures_sink::Sink;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::Context as TaskContext;
use std::task::Poll;

pin_project! {
    /// A future, stream, or sink carrying its own tracing scope.
    ///
    /// The wrapped scope is a snapshot taken when the wrapper was created;
    /// it is attached to the polling thread for exactly the duration of each
    /// poll. Scope changes made by whatever else runs on that thread are
    /// therefore never observed here, and scope changes made inside the
    /// wrapped work never leak out.
    #[derive(Clone, Debug)]
    pub struct WithScope<T> {
        #[pin]
        inner: T,
        scope: Scope,
    }
}

impl<T: std::future::Future> std::future::Future for WithScope<T> {
    type Output = T::Output;

    fn poll(self: Pin<&mut Self>, task_cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _guard = this.scope.clone().attach();

        this.inner.poll(task_cx)
    }
}

impl<T: Stream> Stream for WithScope<T> {
    type Item = T::Item;

    fn poll_next(self: Pin<&mut Self>, task_cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let _guard = this.scope.clone().attach();
        T::poll_next(this.inner, task_cx)
    }
}

impl<I, T: Sink<I>> Sink<I> for WithScope<T> {
    type Error = T::Error;

    fn poll_ready(
        self: Pin<&mut Self>,
        task_cx: &mut TaskContext<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        let this = self.project();
        let _guard = this.scope.clone().attach();
        T::poll_ready(this.inner, task_cx)
    }

    fn start_send(self: Pin<&mut Self>, item: I) -> Result<(), Self::Error> {
        let this = self.project();
        let _guard = this.scope.clone().attach();
        T::start_send(this.inner, item)
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        task_cx: &mut TaskContext<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        let this = self.project();
        let _guard = this.scope.clone().attach();
        T::poll_flush(this.inner, task_cx)
    }

    fn poll_close(
        self: Pin<&mut Self>,
        task_cx: &mut TaskContext<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        let this = self.project();
        let _guard = this.scope.clone().attach();
        T::poll_close(this.inner, task_cx)
    }
}

// The following three extension traits are _almost_ identical, but need to
// be separate to avoid overlapping implementation errors.

impl<F: std::future::Future> FutureScopeExt for F {}

/// Extension trait attaching a tracing scope to futures.
pub trait FutureScopeExt: Sized {
    /// Carry the provided [`Scope`] with this future, returning a
    /// [`WithScope`] wrapper.
    ///
    /// The scope will be current while this future is being polled. Pass a
    /// snapshot of the creating task's scope to fork it into the new unit of
    /// work:
    ///
    /// ```
    /// use tracekit::{Context, ScopeManager};
    /// use tracekit::scope::FutureScopeExt;
    ///
    /// async fn some_work() {}
    ///
    /// let manager = ScopeManager::new(Context::new());
    ///
    /// // some_work sees the creating task's scope, isolated from later
    /// // changes on either side.
    /// let traced = some_work().with_scope(manager.current());
    /// # drop(traced);
    /// ```
    fn with_scope(self, scope: Scope) -> WithScope<Self> {
        WithScope { inner: self, scope }
    }
}

impl<S: Stream> StreamScopeExt for S {}

/// Extension trait attaching a tracing scope to streams.
pub trait StreamScopeExt: Sized {
    /// Carry the provided [`Scope`] with this stream, returning a
    /// [`WithScope`] wrapper.
    ///
    /// The scope will be current while the stream is being polled.
    fn with_scope(self, scope: Scope) -> WithScope<Self> {
        WithScope { inner: self, scope }
    }
}

impl<_I, S: Sink<_I>> SinkScopeExt<_I> for S {}

/// Extension trait attaching a tracing scope to sinks.
///
/// The generic argument is unused.
pub trait SinkScopeExt<_I>: Sized {
    /// Carry the provided [`Scope`] with this sink, returning a
    /// [`WithScope`] wrapper.
    ///
    /// The scope will be current while the sink is being polled.
    fn with_scope(self, scope: Scope) -> WithScope<Self> {
        WithScope { inner: self, scope }
    }
}
