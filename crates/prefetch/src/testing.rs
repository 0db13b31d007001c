//! Hand-written sources for exercising the engine.
//!
//! `mockall` covers call-order expectations in the integration tests; these
//! sources cover the cases where a test needs to observe the source from
//! the consumer side (pull counts, delays, failure position).

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use thiserror::Error;

use crate::source::SequenceSource;

/// Error produced by [`VecSource`] when configured to fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("disk error at position {position}")]
pub struct DiskError {
    pub position: usize,
}

/// Source yielding a fixed list, optionally failing at a given position.
#[derive(Debug, Clone)]
pub struct VecSource<T> {
    items: Vec<T>,
    index: usize,
    fail_at: Option<usize>,
    delay: Option<Duration>,
}

impl<T> VecSource<T> {
    /// Create a source that yields `items` and then stops.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            index: 0,
            fail_at: None,
            delay: None,
        }
    }

    /// Fail with [`DiskError`] on the pull at `position` (0-based).
    pub fn failing_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }

    /// Sleep before every pull.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl<T: Clone + Send + 'static> SequenceSource for VecSource<T> {
    type Item = T;
    type Error = DiskError;

    fn pull(&mut self) -> Option<Result<T, DiskError>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let position = self.index;
        self.index += 1;

        if self.fail_at == Some(position) {
            return Some(Err(DiskError { position }));
        }
        self.items.get(position).cloned().map(Ok)
    }
}

/// Infinite source of `0, 1, 2, ...` that counts its pulls.
#[derive(Debug, Clone, Default)]
pub struct CountingSource {
    pulls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared pull counter, readable after the source moved to the worker.
    pub fn pulls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pulls)
    }
}

impl SequenceSource for CountingSource {
    type Item = usize;
    type Error = DiskError;

    fn pull(&mut self) -> Option<Result<usize, DiskError>> {
        Some(Ok(self.pulls.fetch_add(1, Ordering::SeqCst)))
    }
}

/// Source that yields `0..good` and panics on the next pull.
#[derive(Debug, Clone)]
pub struct PanickingSource {
    good: usize,
    index: usize,
}

impl PanickingSource {
    pub fn new(good: usize) -> Self {
        Self { good, index: 0 }
    }
}

impl SequenceSource for PanickingSource {
    type Item = usize;
    type Error = DiskError;

    fn pull(&mut self) -> Option<Result<usize, DiskError>> {
        if self.index >= self.good {
            panic!("source exploded after {} values", self.good);
        }
        self.index += 1;
        Some(Ok(self.index - 1))
    }
}
