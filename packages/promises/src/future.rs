//! The consumer handle for an eventual outcome.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cell::{Cell, Continuation, Outcome};
use crate::error::Error;
use crate::futurize::{self, Futurize};
use crate::promise::Promise;

/// Status reported by the timed waits on a [`Future`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The outcome is present; a claim will not block.
    Ready,

    /// The deadline passed before an outcome was published.
    Timeout,

    /// Reserved for compatibility with deferred evaluation; never produced
    /// by this crate.
    Deferred,
}

/// One-shot receiver for an eventual outcome.
///
/// A future is obtained from a [`Promise`] (or built already resolved via
/// [`ready`] / [`failed`]) and observed exactly once: [`get`](Future::get)
/// claims the outcome, while [`then`](Future::then) hands it to a
/// continuation. Either way the handle is consumed and further claims report
/// [`Error::NoState`].
///
/// The handle is movable but not copyable; at most one consumer exists per
/// producer.
///
/// # Example
///
/// ```rust
/// use promises::Promise;
///
/// let mut promise = Promise::<i32>::new();
/// let mut future = promise.future().unwrap();
///
/// promise.set_value(42).unwrap();
/// assert_eq!(future.get().unwrap(), 42);
/// ```
pub struct Future<T>
where
    T: Send + 'static,
{
    state: FutureState<T>,
}

enum FutureState<T>
where
    T: Send + 'static,
{
    /// Connected to a live producer through the shared cell.
    Attached(Arc<Cell<T>>),

    /// Carries its outcome inline; no cell was ever allocated.
    Ready(Outcome<T>),

    /// The outcome has been claimed or handed to a continuation.
    Consumed,
}

/// Builds a future already resolved with `value`.
///
/// No cell is allocated and no lock is ever taken on the resulting handle.
///
/// # Example
///
/// ```rust
/// use promises::ready;
///
/// let mut future = ready("done");
/// assert_eq!(future.get().unwrap(), "done");
/// ```
#[must_use]
pub fn ready<T>(value: T) -> Future<T>
where
    T: Send + 'static,
{
    Future::from_outcome(Outcome::Value(value))
}

/// Builds a future already resolved with an error.
///
/// Accepts anything convertible into a boxed error, including plain message
/// strings.
///
/// # Example
///
/// ```rust
/// use promises::failed;
///
/// let mut future = failed::<i32>("out of cheese");
/// assert!(future.failed());
/// assert!(future.get().is_err());
/// ```
#[must_use]
pub fn failed<T>(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Future<T>
where
    T: Send + 'static,
{
    Future::from_outcome(Outcome::Error(Error::other(error)))
}

impl<T> Future<T>
where
    T: Send + 'static,
{
    pub(crate) fn attached(cell: Arc<Cell<T>>) -> Self {
        Self {
            state: FutureState::Attached(cell),
        }
    }

    pub(crate) fn from_outcome(outcome: Outcome<T>) -> Self {
        Self {
            state: FutureState::Ready(outcome),
        }
    }

    /// Claims the outcome, blocking until the producer publishes one.
    ///
    /// Returns the published value or the published error. The handle is
    /// consumed either way; a second call reports [`Error::NoState`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use promises::{Error, ready};
    ///
    /// let mut future = ready(13);
    /// assert_eq!(future.get().unwrap(), 13);
    /// assert!(matches!(future.get(), Err(Error::NoState)));
    /// ```
    pub fn get(&mut self) -> Result<T, Error> {
        match mem::replace(&mut self.state, FutureState::Consumed) {
            FutureState::Consumed => Err(Error::NoState),
            FutureState::Ready(outcome) => outcome.into_result(),
            FutureState::Attached(cell) => cell.claim().into_result(),
        }
    }

    /// Whether the handle still carries an outcome to claim.
    #[must_use]
    pub fn valid(&self) -> bool {
        !matches!(self.state, FutureState::Consumed)
    }

    /// Whether the outcome is already present, without blocking.
    #[must_use]
    pub fn ready(&self) -> bool {
        match &self.state {
            FutureState::Attached(cell) => cell.is_published(),
            FutureState::Ready(_) => true,
            FutureState::Consumed => false,
        }
    }

    /// Whether the outcome is already present and is an error.
    ///
    /// Reports `false` while the outcome is still pending.
    #[must_use]
    pub fn failed(&self) -> bool {
        match &self.state {
            FutureState::Attached(cell) => cell.is_failed(),
            FutureState::Ready(outcome) => outcome.is_error(),
            FutureState::Consumed => false,
        }
    }

    /// Blocks until the outcome is present, without claiming it.
    pub fn wait(&self) {
        if let FutureState::Attached(cell) = &self.state {
            cell.wait();
        }
    }

    /// Blocks until the outcome is present or `timeout` elapses, without
    /// claiming it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use promises::{Promise, WaitStatus};
    ///
    /// let mut promise = Promise::<i32>::new();
    /// let future = promise.future().unwrap();
    ///
    /// let status = future.wait_for(Duration::from_micros(100));
    /// assert_eq!(status, WaitStatus::Timeout);
    /// ```
    pub fn wait_for(&self, timeout: Duration) -> WaitStatus {
        self.wait_until(Instant::now() + timeout)
    }

    /// Blocks until the outcome is present or `deadline` passes, without
    /// claiming it.
    pub fn wait_until(&self, deadline: Instant) -> WaitStatus {
        match &self.state {
            FutureState::Attached(cell) => cell.wait_until(deadline),
            FutureState::Ready(_) | FutureState::Consumed => WaitStatus::Ready,
        }
    }

    /// Attaches a continuation that receives this future, resolved, and
    /// produces the outcome of the returned future.
    ///
    /// If the outcome is already present the continuation runs immediately on
    /// the calling thread. Otherwise it is registered on the shared cell and
    /// runs on whichever thread publishes the outcome - including the thread
    /// that drops an unresolved producer. Each continuation runs exactly
    /// once. Note that a deep chain of pending continuations therefore
    /// resolves recursively on the publishing thread's stack.
    ///
    /// The continuation's return shape is normalized by [`Futurize`]:
    /// a `Result` publishes its value or error, a unit return publishes a
    /// unit value, and a returned future is flattened into the chain. A
    /// panic inside the continuation is captured and published as an error.
    ///
    /// Calling `then` consumes this handle; on an already-consumed handle
    /// the produced future reports [`Error::NoState`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use promises::{Error, Future, ready};
    ///
    /// let mut doubled = ready(21).then(|mut f: Future<i32>| -> Result<i32, Error> {
    ///     Ok(f.get()? * 2)
    /// });
    /// assert_eq!(doubled.get().unwrap(), 42);
    /// ```
    #[must_use]
    pub fn then<K, R>(mut self, continuation: K) -> Future<R::Target>
    where
        K: FnOnce(Future<T>) -> R + Send + 'static,
        R: Futurize,
    {
        match mem::replace(&mut self.state, FutureState::Consumed) {
            FutureState::Consumed => Future::from_outcome(Outcome::Error(Error::NoState)),
            FutureState::Ready(outcome) => {
                futurize::apply(continuation, Future::from_outcome(outcome))
            }
            FutureState::Attached(cell) => {
                if let Some(outcome) = cell.try_claim() {
                    return futurize::apply(continuation, Future::from_outcome(outcome));
                }

                let mut chained = Promise::new();
                let future = chained
                    .future()
                    .expect("a fresh promise has not handed out its consumer");

                let wrapper: Continuation<T> = Box::new(move |outcome| {
                    futurize::apply(continuation, Future::from_outcome(outcome)).forward(chained);
                });

                // Publication may have won the race since the claim probe; in
                // that case the continuation runs here, on the attaching
                // thread.
                if let Some((wrapper, outcome)) = cell.chain(wrapper) {
                    wrapper(outcome);
                }

                future
            }
        }
    }

    /// Routes this future's eventual outcome into `destination`.
    ///
    /// Publishes immediately when the outcome is already present; otherwise
    /// registers a forwarding continuation so the publishing thread is never
    /// blocked here.
    pub(crate) fn forward(mut self, destination: Promise<T>) {
        match mem::replace(&mut self.state, FutureState::Consumed) {
            FutureState::Consumed => destination.publish(Outcome::Error(Error::NoState)),
            FutureState::Ready(outcome) => destination.publish(outcome),
            FutureState::Attached(cell) => {
                if let Some(outcome) = cell.try_claim() {
                    destination.publish(outcome);
                    return;
                }

                let wrapper: Continuation<T> =
                    Box::new(move |outcome| destination.publish(outcome));

                if let Some((wrapper, outcome)) = cell.chain(wrapper) {
                    wrapper(outcome);
                }
            }
        }
    }
}

impl<T> Default for Future<T>
where
    T: Send + 'static,
{
    /// Builds a vacant future carrying no shared state.
    ///
    /// A vacant handle reports `valid() == false` and `ready() == false`;
    /// claiming it reports [`Error::NoState`]. The `any` combinator uses
    /// vacant handles for the slots whose inputs were not chosen.
    fn default() -> Self {
        Self {
            state: FutureState::Consumed,
        }
    }
}

impl<T> fmt::Debug for Future<T>
where
    T: Send + 'static,
{
    #[cfg_attr(test, mutants::skip)] // No API contract for debug formatting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            FutureState::Attached(_) => "attached",
            FutureState::Ready(outcome) if outcome.is_error() => "failed",
            FutureState::Ready(_) => "ready",
            FutureState::Consumed => "consumed",
        };
        f.debug_struct("Future").field("state", &state).finish()
    }
}
