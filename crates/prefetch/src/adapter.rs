//! Wrappers that put a `Prefetch` in front of sources and source factories.

use std::{convert::Infallible, fmt, iter::FusedIterator};

use crate::{
    config::PrefetchConfig, engine::Prefetch, error::PullError, source::SequenceSource,
};

/// Wrap a source factory so every call returns a fresh [`Prefetch`].
///
/// Multi-argument factories take their arguments as a tuple. Calls share
/// nothing: each one gets its own channel and worker thread.
///
/// ```
/// use prefetch::prefetch;
///
/// let count_to = prefetch(1, |n: u32| (0..n).map(Ok::<_, std::io::Error>));
/// let first: Vec<_> = count_to(3).map(Result::unwrap).collect();
/// let second: Vec<_> = count_to(2).map(Result::unwrap).collect();
/// assert_eq!(first, [0, 1, 2]);
/// assert_eq!(second, [0, 1]);
/// ```
pub fn prefetch<A, S, F>(max_prefetch: isize, f: F) -> impl Fn(A) -> Prefetch<S::Item, S::Error>
where
    S: SequenceSource,
    F: Fn(A) -> S,
{
    prefetch_with(PrefetchConfig::new(max_prefetch), f)
}

/// [`prefetch`] with a full configuration.
pub fn prefetch_with<A, S, F>(
    config: PrefetchConfig,
    f: F,
) -> impl Fn(A) -> Prefetch<S::Item, S::Error>
where
    S: SequenceSource,
    F: Fn(A) -> S,
{
    move |args| Prefetch::with_config(f(args), config.clone())
}

/// Alias of [`prefetch`].
pub fn background<A, S, F>(max_prefetch: isize, f: F) -> impl Fn(A) -> Prefetch<S::Item, S::Error>
where
    S: SequenceSource,
    F: Fn(A) -> S,
{
    prefetch(max_prefetch, f)
}

/// Prefetch iterators directly.
pub trait PrefetchExt: Iterator + Send + Sized + 'static {
    /// Prefetch an infallible iterator, yielding its items as-is.
    ///
    /// A panic on the worker is re-raised on the consumer thread.
    fn prefetch(self, max_prefetch: isize) -> PrefetchValues<Self::Item>
    where
        Self::Item: Send + 'static,
    {
        PrefetchValues {
            inner: Prefetch::new(self.map(Ok::<_, Infallible>), max_prefetch),
        }
    }

    /// Prefetch an iterator of results.
    fn try_prefetch<T, E>(self, max_prefetch: isize) -> Prefetch<T, E>
    where
        Self: Iterator<Item = Result<T, E>>,
        T: Send + 'static,
        E: Send + 'static,
    {
        Prefetch::new(self, max_prefetch)
    }
}

impl<I: Iterator + Send + 'static> PrefetchExt for I {}

/// Iterator returned by [`PrefetchExt::prefetch`].
pub struct PrefetchValues<T> {
    inner: Prefetch<T, Infallible>,
}

impl<T> PrefetchValues<T> {
    /// Access the underlying engine.
    pub fn get_ref(&self) -> &Prefetch<T, Infallible> {
        &self.inner
    }
}

impl<T> Iterator for PrefetchValues<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.inner.next()? {
            Ok(item) => Some(item),
            Err(PullError::Panicked { message }) => panic!("prefetch worker panicked: {message}"),
            Err(PullError::Source(never)) => match never {},
        }
    }
}

impl<T> FusedIterator for PrefetchValues<T> {}

impl<T> fmt::Debug for PrefetchValues<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrefetchValues").field(&self.inner).finish()
    }
}
