use std::{any::Any, io};

use thiserror::Error;

/// Production failure surfaced to the consumer.
///
/// Delivered exactly once, on the pull that dequeues it. Every later pull
/// reports exhaustion.
#[derive(Debug, Error)]
pub enum PullError<E> {
    /// The source returned an error.
    #[error("sequence source failed: {0}")]
    Source(E),

    /// The source panicked while being pulled on the worker thread.
    #[error("sequence source panicked: {message}")]
    Panicked { message: String },
}

impl<E> PullError<E> {
    /// Whether the failure came from a panic rather than a returned error.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }

    /// The source's own error, if that is what failed.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Source(e) => Some(e),
            Self::Panicked { .. } => None,
        }
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// The worker thread could not be started.
#[derive(Debug, Error)]
#[error("failed to spawn prefetch worker `{name}`: {source}")]
pub struct SpawnError {
    pub name: String,
    #[source]
    pub source: io::Error,
}
