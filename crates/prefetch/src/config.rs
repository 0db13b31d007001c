//! Prefetch configuration.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Default number of values computed ahead of the consumer.
pub const DEFAULT_MAX_PREFETCH: isize = 1;

/// Default name of the worker thread.
pub const DEFAULT_THREAD_NAME: &str = "prefetch-worker";

/// Size of the handoff buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// At most `n` produced-but-unconsumed values; the worker blocks beyond that.
    Bounded(NonZeroUsize),
    /// The worker never blocks on handoff.
    Unbounded,
}

impl Capacity {
    /// Map a `max_prefetch` value to a capacity: `<= 0` means unbounded.
    pub fn from_max_prefetch(max_prefetch: isize) -> Self {
        usize::try_from(max_prefetch)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(Capacity::Unbounded, Capacity::Bounded)
    }

    /// Buffer limit, `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        match self {
            Capacity::Bounded(n) => Some(n.get()),
            Capacity::Unbounded => None,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::from_max_prefetch(DEFAULT_MAX_PREFETCH)
    }
}

impl From<isize> for Capacity {
    fn from(max_prefetch: isize) -> Self {
        Capacity::from_max_prefetch(max_prefetch)
    }
}

/// Configuration for a [`Prefetch`](crate::Prefetch) engine.
///
/// All fields have defaults, so partial documents deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    /// How many values may be computed ahead (default: 1).
    ///
    /// `<= 0` lets the worker run arbitrarily far ahead, limited only by memory.
    pub max_prefetch: isize,

    /// Worker thread name (default: `prefetch-worker`).
    pub thread_name: Option<String>,

    /// Worker thread stack size in bytes (default: platform default).
    pub stack_size: Option<usize>,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            max_prefetch: DEFAULT_MAX_PREFETCH,
            thread_name: None,
            stack_size: None,
        }
    }
}

impl PrefetchConfig {
    /// Create a configuration with the given `max_prefetch` and defaults otherwise.
    pub fn new(max_prefetch: isize) -> Self {
        Self {
            max_prefetch,
            ..Self::default()
        }
    }

    pub fn with_max_prefetch(mut self, max_prefetch: isize) -> Self {
        self.max_prefetch = max_prefetch;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Buffer capacity derived from `max_prefetch`.
    pub fn capacity(&self) -> Capacity {
        Capacity::from_max_prefetch(self.max_prefetch)
    }

    pub(crate) fn thread_name(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(DEFAULT_THREAD_NAME)
    }
}
