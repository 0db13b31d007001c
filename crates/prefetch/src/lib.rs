//! Run a pull-based sequence ahead of its consumer on a background thread.
//!
//! Producing the next value (disk reads, network calls, decoding) then
//! overlaps with consuming the current one.
//!
//! - **`SequenceSource`**: anything that can be pulled for the next value.
//!   Every `Iterator<Item = Result<T, E>>` qualifies.
//! - **`Prefetch`**: spawns one worker thread that drains the source into a
//!   bounded channel and exposes the consumer side as an `Iterator`.
//! - **`prefetch`**: wraps a source factory so each call returns a fresh `Prefetch`.
//!
//! ## Handoff protocol
//!
//! The worker sends `Slot::Value` for every produced value and exactly one
//! terminal slot as its last message: `Slot::Failure` if the source failed or
//! panicked, `Slot::End` otherwise. The consumer returns values in production
//! order, surfaces a failure once, and reports exhaustion (`None`) on every
//! pull after the terminal slot.
//!
//! ## Backpressure
//!
//! With `max_prefetch = n > 0` the channel holds at most `n` unconsumed
//! values and the worker blocks on the next handoff. `max_prefetch <= 0`
//! removes the bound.
//!
//! ```
//! use prefetch::PrefetchExt;
//!
//! let squares: Vec<u64> = (1..=4u64).map(|n| n * n).prefetch(2).collect();
//! assert_eq!(squares, [1, 4, 9, 16]);
//! ```

#![forbid(unsafe_code)]

mod adapter;
mod config;
mod engine;
mod error;
mod slot;
mod source;
mod worker;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapter::{PrefetchExt, PrefetchValues, background, prefetch, prefetch_with};
pub use config::{Capacity, DEFAULT_MAX_PREFETCH, DEFAULT_THREAD_NAME, PrefetchConfig};
pub use engine::Prefetch;
pub use error::{PullError, SpawnError};
pub use slot::Slot;
pub use source::{MapItems, SequenceSource};
pub use worker::PrefetchWorker;
