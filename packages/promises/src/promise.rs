//! The producer handle for an eventual outcome.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::cell::{Cell, Outcome};
use crate::error::Error;
use crate::future::Future;

/// One-shot sender for an eventual outcome.
///
/// A promise owns the producer side of a shared cell and hands out exactly
/// one [`Future`] for the consumer side. It publishes exactly once, through
/// [`set_value`](Promise::set_value) or [`set_error`](Promise::set_error);
/// publishing may happen before or after the consumer is retrieved, and from
/// any thread.
///
/// Dropping an unresolved promise publishes [`Error::BrokenPromise`] so the
/// consumer is never left waiting forever.
///
/// The handle is movable but not copyable.
///
/// # Example
///
/// ```rust
/// use promises::{Error, Promise};
///
/// let mut promise = Promise::<String>::new();
/// let mut future = promise.future().unwrap();
///
/// promise.set_value("hello".to_string()).unwrap();
/// assert_eq!(future.get().unwrap(), "hello");
/// ```
pub struct Promise<T>
where
    T: Send + 'static,
{
    cell: Arc<Cell<T>>,
    resolved: bool,
    consumer_taken: bool,
}

impl<T> Promise<T>
where
    T: Send + 'static,
{
    /// Creates a new promise with a pending outcome.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Cell::new()),
            resolved: false,
            consumer_taken: false,
        }
    }

    /// Hands out the paired consumer handle.
    ///
    /// Succeeds exactly once; a second call reports [`Error::NoState`]. The
    /// consumer may be retrieved after the outcome has already been
    /// published.
    pub fn future(&mut self) -> Result<Future<T>, Error> {
        if self.consumer_taken {
            return Err(Error::NoState);
        }
        self.consumer_taken = true;
        Ok(Future::attached(Arc::clone(&self.cell)))
    }

    /// Publishes a value as the outcome.
    ///
    /// Reports [`Error::NoState`] if an outcome has already been published.
    pub fn set_value(&mut self, value: T) -> Result<(), Error> {
        self.resolve(Outcome::Value(value))
    }

    /// Publishes an error as the outcome.
    ///
    /// Accepts anything convertible into a boxed error, including plain
    /// message strings. Reports [`Error::NoState`] if an outcome has already
    /// been published.
    ///
    /// # Example
    ///
    /// ```rust
    /// use promises::Promise;
    ///
    /// let mut promise = Promise::<i32>::new();
    /// let mut future = promise.future().unwrap();
    ///
    /// promise.set_error("sensor offline").unwrap();
    /// assert_eq!(future.get().unwrap_err().to_string(), "sensor offline");
    /// ```
    pub fn set_error(
        &mut self,
        error: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Result<(), Error> {
        self.resolve(Outcome::Error(Error::other(error)))
    }

    /// Publishes an already-formed outcome, consuming the promise.
    ///
    /// A no-op when the promise has already resolved; internal call sites
    /// publish at most once.
    pub(crate) fn publish(mut self, outcome: Outcome<T>) {
        if !self.resolved {
            self.resolved = true;
            self.cell.publish(outcome);
        }
    }

    fn resolve(&mut self, outcome: Outcome<T>) -> Result<(), Error> {
        if self.resolved {
            return Err(Error::NoState);
        }
        self.resolved = true;
        self.cell.publish(outcome);
        Ok(())
    }
}

impl<T> Default for Promise<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Promise<T>
where
    T: Send + 'static,
{
    /// Publishes [`Error::BrokenPromise`] when dropped unresolved.
    ///
    /// A continuation registered on the paired consumer runs inline here,
    /// like on any other publish.
    fn drop(&mut self) {
        if !self.resolved {
            trace!("promise dropped without an outcome, publishing broken-promise");
            self.resolved = true;
            self.cell.publish(Outcome::Error(Error::BrokenPromise));
        }
    }
}

impl<T> fmt::Debug for Promise<T>
where
    T: Send + 'static,
{
    #[cfg_attr(test, mutants::skip)] // No API contract for debug formatting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("resolved", &self.resolved)
            .field("consumer_taken", &self.consumer_taken)
            .finish()
    }
}
