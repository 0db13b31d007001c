//! Pull contract for sequence producers.

/// A lazily evaluated, possibly unbounded producer of values.
///
/// Only the background worker ever calls [`pull`](SequenceSource::pull), so
/// implementations need to be `Send` but never `Sync`.
///
/// Every `Iterator<Item = Result<T, E>>` is a source. Infallible iterators
/// go through [`PrefetchExt::prefetch`](crate::PrefetchExt::prefetch).
pub trait SequenceSource: Send + 'static {
    /// Type of produced values.
    type Item: Send + 'static;

    /// Type of production failures.
    type Error: Send + 'static;

    /// Produce the next value.
    ///
    /// - `Some(Ok(item))`: a value.
    /// - `Some(Err(e))`: production failed; the source is not pulled again.
    /// - `None`: the source is exhausted.
    fn pull(&mut self) -> Option<Result<Self::Item, Self::Error>>;

    /// Apply `f` to every produced value on the worker thread.
    ///
    /// Failures and exhaustion pass through untouched.
    fn map_items<U, F>(self, f: F) -> MapItems<Self, F>
    where
        Self: Sized,
        U: Send + 'static,
        F: FnMut(Self::Item) -> U + Send + 'static,
    {
        MapItems { source: self, f }
    }
}

impl<I, T, E> SequenceSource for I
where
    I: Iterator<Item = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    fn pull(&mut self) -> Option<Result<T, E>> {
        self.next()
    }
}

/// Source returned by [`SequenceSource::map_items`].
#[derive(Debug, Clone)]
pub struct MapItems<S, F> {
    source: S,
    f: F,
}

impl<S, F> MapItems<S, F> {
    /// Unwrap the underlying source, discarding the transform.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S, U, F> SequenceSource for MapItems<S, F>
where
    S: SequenceSource,
    U: Send + 'static,
    F: FnMut(S::Item) -> U + Send + 'static,
{
    type Item = U;
    type Error = S::Error;

    fn pull(&mut self) -> Option<Result<U, S::Error>> {
        self.source.pull().map(|res| res.map(&mut self.f))
    }
}
