//! Transport unit moved from the worker to the consumer.

use crate::error::PullError;

/// One entry of the handoff buffer.
///
/// The worker sends at most one terminal slot (`Failure` or `End`) and it is
/// always the last slot it sends.
#[derive(Debug)]
pub enum Slot<T, E> {
    /// A produced value.
    Value(T),
    /// Production failed; carried as data, not as a cross-thread panic.
    Failure(PullError<E>),
    /// The source is exhausted.
    End,
}

impl<T, E> Slot<T, E> {
    /// Check if this slot ends the sequence.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Slot::Value(_))
    }

    /// Short tag for logging.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Slot::Value(_) => "value",
            Slot::Failure(_) => "failure",
            Slot::End => "end",
        }
    }
}

impl<T, E> From<Result<T, E>> for Slot<T, E> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(item) => Slot::Value(item),
            Err(e) => Slot::Failure(PullError::Source(e)),
        }
    }
}
