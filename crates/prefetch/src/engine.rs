//! Consumer handle of a prefetching sequence.

use std::{fmt, iter::FusedIterator, thread};

use tracing::{trace, warn};

use crate::{
    config::{Capacity, PrefetchConfig},
    error::{PullError, SpawnError},
    slot::Slot,
    source::SequenceSource,
    worker::PrefetchWorker,
};

/// A sequence computed one step (or more) ahead on a background thread.
///
/// Construction starts exactly one detached worker thread that pulls from the
/// source and hands values over through a channel of the configured
/// [`Capacity`]. The handle is an [`Iterator`] yielding `Ok(value)` in
/// production order, at most one `Err(PullError)`, and then `None` forever.
///
/// Exactly one consumer is supported. The worker is never joined, so an
/// abandoned engine does not keep the process alive. Dropping the handle
/// closes the channel and a worker blocked on a full buffer exits on its
/// pending handoff; a worker blocked inside the source's own `pull` stays
/// there until the source returns.
///
/// ## Usage
///
/// ```
/// use prefetch::Prefetch;
///
/// let lines = vec![Ok::<_, std::io::Error>("a"), Ok("b")].into_iter();
/// let values: Vec<_> = Prefetch::new(lines, 1).map(Result::unwrap).collect();
/// assert_eq!(values, ["a", "b"]);
/// ```
pub struct Prefetch<T, E> {
    data_rx: kanal::Receiver<Slot<T, E>>,
    capacity: Capacity,
    finished: bool,
}

impl<T: Send + 'static, E: Send + 'static> Prefetch<T, E> {
    /// Start prefetching `source`, keeping at most `max_prefetch` values ahead.
    ///
    /// `max_prefetch <= 0` means unbounded.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create the worker thread, like
    /// [`std::thread::spawn`]. Use [`Prefetch::try_new`] to handle that case.
    pub fn new<S>(source: S, max_prefetch: isize) -> Self
    where
        S: SequenceSource<Item = T, Error = E>,
    {
        Self::with_config(source, PrefetchConfig::new(max_prefetch))
    }

    /// Start prefetching `source` with a full configuration.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create the worker thread.
    pub fn with_config<S>(source: S, config: PrefetchConfig) -> Self
    where
        S: SequenceSource<Item = T, Error = E>,
    {
        match Self::try_with_config(source, config) {
            Ok(engine) => engine,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible counterpart of [`Prefetch::new`].
    pub fn try_new<S>(source: S, max_prefetch: isize) -> Result<Self, SpawnError>
    where
        S: SequenceSource<Item = T, Error = E>,
    {
        Self::try_with_config(source, PrefetchConfig::new(max_prefetch))
    }

    /// Fallible counterpart of [`Prefetch::with_config`].
    ///
    /// Never pulls from the source itself and never waits for a value;
    /// source errors surface later, at pull time.
    pub fn try_with_config<S>(source: S, config: PrefetchConfig) -> Result<Self, SpawnError>
    where
        S: SequenceSource<Item = T, Error = E>,
    {
        let capacity = config.capacity();
        let (data_tx, data_rx) = match capacity {
            Capacity::Bounded(n) => kanal::bounded(n.get()),
            Capacity::Unbounded => kanal::unbounded(),
        };

        let name = config.thread_name().to_string();
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(bytes) = config.stack_size {
            builder = builder.stack_size(bytes);
        }

        let worker = PrefetchWorker::new(source, data_tx);
        let handle = builder
            .spawn(move || worker.run())
            .map_err(|source| SpawnError {
                name: name.clone(),
                source,
            })?;
        // Detached: never joined, so it cannot hold up process exit.
        drop(handle);

        trace!(thread = %name, ?capacity, "Prefetch: worker spawned");

        Ok(Self {
            data_rx,
            capacity,
            finished: false,
        })
    }

    /// Start prefetching with a per-value transform applied by the worker.
    ///
    /// Same as `Prefetch::new(source.map_items(f), max_prefetch)`.
    #[deprecated(note = "compose the transform into the source with `SequenceSource::map_items`")]
    pub fn with_preprocess<S, F>(source: S, max_prefetch: isize, f: F) -> Self
    where
        S: SequenceSource<Error = E>,
        F: FnMut(S::Item) -> T + Send + 'static,
    {
        Self::new(source.map_items(f), max_prefetch)
    }
}

impl<T, E> Prefetch<T, E> {
    /// Configured buffer capacity.
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Whether a terminal slot has been observed.
    ///
    /// Once true, every pull returns `None` without touching the channel.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of produced-but-unconsumed slots currently buffered.
    pub fn buffered(&self) -> usize {
        if self.finished { 0 } else { self.data_rx.len() }
    }

    /// Pull the next value, awaiting the worker instead of blocking the thread.
    ///
    /// Same contract as [`Iterator::next`].
    pub async fn next_async(&mut self) -> Option<Result<T, PullError<E>>> {
        if self.finished {
            return None;
        }
        let received = self.data_rx.as_async().recv().await;
        self.decode(received.ok())
    }

    fn decode(&mut self, slot: Option<Slot<T, E>>) -> Option<Result<T, PullError<E>>> {
        match slot {
            Some(Slot::Value(item)) => Some(Ok(item)),
            Some(Slot::Failure(err)) => {
                trace!("Prefetch: failure received, finishing");
                self.finished = true;
                Some(Err(err))
            }
            Some(Slot::End) => {
                trace!("Prefetch: end received, finishing");
                self.finished = true;
                None
            }
            None => {
                warn!("Prefetch: worker disconnected without terminal slot");
                self.finished = true;
                None
            }
        }
    }
}

impl<T, E> Iterator for Prefetch<T, E> {
    type Item = Result<T, PullError<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let received = self.data_rx.recv();
        self.decode(received.ok())
    }
}

impl<T, E> FusedIterator for Prefetch<T, E> {}

impl<T, E> fmt::Debug for Prefetch<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prefetch")
            .field("capacity", &self.capacity)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
