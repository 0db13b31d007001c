//! Background loop that drains a source into the handoff channel.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use crate::{
    error::{PullError, panic_message},
    slot::Slot,
    source::SequenceSource,
};

/// Worker that pulls from a [`SequenceSource`] and pushes [`Slot`]s.
///
/// Sole owner of the source. Runs on its own thread:
///
/// ```ignore
/// let (data_tx, data_rx) = kanal::bounded(4);
/// let worker = PrefetchWorker::new(source, data_tx);
/// std::thread::spawn(move || worker.run());
/// ```
pub struct PrefetchWorker<S: SequenceSource> {
    source: S,
    data_tx: kanal::Sender<Slot<S::Item, S::Error>>,
}

impl<S: SequenceSource> PrefetchWorker<S> {
    /// Create a new worker.
    pub fn new(source: S, data_tx: kanal::Sender<Slot<S::Item, S::Error>>) -> Self {
        Self { source, data_tx }
    }

    /// Run the worker loop until a terminal slot is sent or the consumer is gone.
    pub fn run(self) {
        trace!("PrefetchWorker started");

        let Self {
            mut source,
            data_tx,
        } = self;
        let mut guard = TerminalGuard::new(&data_tx);
        let mut produced: u64 = 0;

        loop {
            let slot = match panic::catch_unwind(AssertUnwindSafe(|| source.pull())) {
                Ok(Some(res)) => Slot::from(res),
                Ok(None) => {
                    debug!(produced, "PrefetchWorker: source exhausted");
                    Slot::End
                }
                Err(payload) => {
                    let message = panic_message(&*payload);
                    warn!(produced, %message, "PrefetchWorker: source panicked");
                    Slot::Failure(PullError::Panicked { message })
                }
            };

            let terminal = slot.is_terminal();
            if terminal {
                trace!(kind = slot.kind(), "PrefetchWorker: sending terminal slot");
                guard.disarm();
            }

            // Blocks while the buffer is full.
            if data_tx.send(slot).is_err() {
                trace!(produced, "PrefetchWorker: consumer dropped, shutting down");
                guard.disarm();
                break;
            }

            if terminal {
                break;
            }
            produced += 1;
        }

        trace!(produced, "PrefetchWorker stopped");
    }
}

/// Sends `End` on drop unless a terminal slot was already handed off.
struct TerminalGuard<'a, T, E> {
    data_tx: &'a kanal::Sender<Slot<T, E>>,
    armed: bool,
}

impl<'a, T, E> TerminalGuard<'a, T, E> {
    fn new(data_tx: &'a kanal::Sender<Slot<T, E>>) -> Self {
        Self {
            data_tx,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T, E> Drop for TerminalGuard<'_, T, E> {
    fn drop(&mut self) {
        if self.armed {
            trace!("PrefetchWorker: loop left without terminal slot, sending end");
            let _ = self.data_tx.send(Slot::End);
        }
    }
}
