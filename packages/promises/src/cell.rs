//! The shared outcome cell connecting one producer to one consumer.
//!
//! The cell is a small state machine guarded by a mutex. A pending cell
//! carries at most one observer: either a thread blocked on the condition
//! variable or a registered continuation, never both (attaching a
//! continuation consumes the consumer handle, so no handle remains that
//! could block). Publishing transitions the cell to its terminal state and
//! either wakes the waiter or dispatches the continuation - always with the
//! lock released, so a continuation that touches other cells cannot deadlock
//! on this one.

use std::mem;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::error::Error;
use crate::future::WaitStatus;

/// A registered continuation, invoked with the published outcome.
pub(crate) type Continuation<T> = Box<dyn FnOnce(Outcome<T>) + Send>;

/// The published result of a producer/consumer pair.
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    Value(T),
    Error(Error),
}

impl<T> Outcome<T> {
    pub(crate) fn into_result(self) -> Result<T, Error> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Error(error) => Err(error),
        }
    }

    pub(crate) fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

enum CellState<T>
where
    T: Send + 'static,
{
    /// No outcome yet and no continuation registered.
    Idle,

    /// No outcome yet; a continuation is registered and will be dispatched
    /// by whichever publish arrives.
    Chained(Continuation<T>),

    /// The outcome has been published and not yet claimed.
    Published(Outcome<T>),

    /// The outcome has been moved out, either by a claiming consumer or into
    /// a dispatched continuation.
    Claimed,
}

pub(crate) struct Cell<T>
where
    T: Send + 'static,
{
    state: Mutex<CellState<T>>,
    published: Condvar,
}

impl<T> Cell<T>
where
    T: Send + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(CellState::Idle),
            published: Condvar::new(),
        }
    }

    /// Publishes the outcome, waking any blocked waiter or dispatching the
    /// registered continuation.
    ///
    /// The continuation runs on the calling thread, after the lock has been
    /// released.
    pub(crate) fn publish(&self, outcome: Outcome<T>) {
        let mut state = self.state.lock();
        match mem::replace(&mut *state, CellState::Claimed) {
            CellState::Idle => {
                *state = CellState::Published(outcome);
                drop(state);
                self.published.notify_all();
            }
            CellState::Chained(continuation) => {
                drop(state);
                trace!("dispatching continuation inline on the publishing thread");
                continuation(outcome);
            }
            CellState::Published(_) | CellState::Claimed => {
                unreachable!("cell already carries a published outcome");
            }
        }
    }

    /// Registers a continuation, or hands it back together with the outcome
    /// if publication won the race.
    ///
    /// The caller must invoke a handed-back continuation itself (on its own
    /// thread); the cell will not dispatch it.
    pub(crate) fn chain(
        &self,
        continuation: Continuation<T>,
    ) -> Option<(Continuation<T>, Outcome<T>)> {
        let mut state = self.state.lock();
        match mem::replace(&mut *state, CellState::Claimed) {
            CellState::Idle => {
                *state = CellState::Chained(continuation);
                None
            }
            CellState::Published(outcome) => Some((continuation, outcome)),
            CellState::Chained(_) | CellState::Claimed => {
                unreachable!("cell already has an observer");
            }
        }
    }

    /// Takes the outcome if one has been published, without blocking.
    pub(crate) fn try_claim(&self) -> Option<Outcome<T>> {
        let mut state = self.state.lock();
        match mem::replace(&mut *state, CellState::Claimed) {
            CellState::Published(outcome) => Some(outcome),
            other => {
                *state = other;
                None
            }
        }
    }

    /// Blocks until an outcome is published, then takes it.
    pub(crate) fn claim(&self) -> Outcome<T> {
        let mut state = self.state.lock();
        while matches!(*state, CellState::Idle) {
            self.published.wait(&mut state);
        }
        match mem::replace(&mut *state, CellState::Claimed) {
            CellState::Published(outcome) => outcome,
            CellState::Idle | CellState::Chained(_) | CellState::Claimed => {
                unreachable!("woken without a published outcome");
            }
        }
    }

    /// Blocks until an outcome is published, leaving it in place.
    pub(crate) fn wait(&self) {
        let mut state = self.state.lock();
        while matches!(*state, CellState::Idle) {
            self.published.wait(&mut state);
        }
    }

    /// Blocks until an outcome is published or the deadline passes, leaving
    /// any outcome in place.
    pub(crate) fn wait_until(&self, deadline: Instant) -> WaitStatus {
        let mut state = self.state.lock();
        while matches!(*state, CellState::Idle) {
            if self.published.wait_until(&mut state, deadline).timed_out()
                && matches!(*state, CellState::Idle)
            {
                return WaitStatus::Timeout;
            }
        }
        WaitStatus::Ready
    }

    pub(crate) fn is_published(&self) -> bool {
        matches!(*self.state.lock(), CellState::Published(_))
    }

    pub(crate) fn is_failed(&self) -> bool {
        matches!(*self.state.lock(), CellState::Published(Outcome::Error(_)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::test_utils::with_watchdog;

    assert_impl_all!(Cell<i32>: Send, Sync);

    #[test]
    fn publish_then_claim() {
        let cell = Cell::new();
        cell.publish(Outcome::Value(42));

        assert!(cell.is_published());
        assert_eq!(cell.claim().into_result().unwrap(), 42);
    }

    #[test]
    fn try_claim_on_idle_is_none() {
        let cell = Cell::<i32>::new();
        assert!(cell.try_claim().is_none());
        assert!(!cell.is_published());
    }

    #[test]
    fn chain_before_publish_dispatches_on_publish() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&invocations);

        let cell = Cell::new();
        let registered = cell.chain(Box::new(move |outcome: Outcome<i32>| {
            assert_eq!(outcome.into_result().unwrap(), 13);
            observed.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(registered.is_none());
        assert_eq!(invocations.load(Ordering::SeqCst), 0);

        cell.publish(Outcome::Value(13));
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chain_after_publish_hands_back_outcome() {
        let cell = Cell::new();
        cell.publish(Outcome::Value(13));

        let (continuation, outcome) = cell
            .chain(Box::new(|_| panic!("cell must not dispatch")))
            .expect("outcome was already published");
        drop(continuation);
        assert_eq!(outcome.into_result().unwrap(), 13);
    }

    #[test]
    fn claim_blocks_until_published() {
        with_watchdog(|| {
            let cell = Arc::new(Cell::new());
            let publisher = Arc::clone(&cell);

            let worker = thread::spawn(move || {
                thread::sleep(Duration::from_millis(1));
                publisher.publish(Outcome::Value(7));
            });

            assert_eq!(cell.claim().into_result().unwrap(), 7);
            worker.join().unwrap();
        });
    }

    #[test]
    fn wait_until_times_out_while_idle() {
        let cell = Cell::<i32>::new();
        let status = cell.wait_until(Instant::now() + Duration::from_micros(100));
        assert_eq!(status, WaitStatus::Timeout);
    }

    #[test]
    fn is_failed_reflects_outcome_kind() {
        let failed = Cell::<i32>::new();
        failed.publish(Outcome::Error(Error::other("boom")));
        assert!(failed.is_failed());

        let succeeded = Cell::new();
        succeeded.publish(Outcome::Value(1));
        assert!(!succeeded.is_failed());
    }
}
