//! Normalization of continuation return shapes into consumer handles.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::cell::Outcome;
use crate::error::Error;
use crate::future::{Future, ready};

/// Adapts a continuation's return shape into a [`Future`].
///
/// Implementations exist for the three shapes a continuation can produce:
///
/// - `Result<T, Error>` - the value-or-raise shape; `Ok` publishes the value,
///   `Err` publishes the error untranslated.
/// - `()` - publishes a unit value.
/// - [`Future<T>`] - the returned future is passed through unchanged, so a
///   continuation that itself produces an eventual outcome chains flatly:
///   the consumer observes `T`, never a nested handle.
pub trait Futurize {
    /// The outcome type carried by the normalized future.
    type Target: Send + 'static;

    /// Converts the return value into a consumer handle.
    fn futurize(self) -> Future<Self::Target>;
}

impl<T> Futurize for Future<T>
where
    T: Send + 'static,
{
    type Target = T;

    fn futurize(self) -> Future<T> {
        self
    }
}

impl<T> Futurize for Result<T, Error>
where
    T: Send + 'static,
{
    type Target = T;

    fn futurize(self) -> Future<T> {
        match self {
            Ok(value) => ready(value),
            Err(error) => Future::from_outcome(Outcome::Error(error)),
        }
    }
}

impl Futurize for () {
    type Target = ();

    fn futurize(self) -> Future<()> {
        ready(())
    }
}

/// Invokes a continuation with its resolved input and normalizes the result.
///
/// A panic inside the continuation is captured and becomes an error outcome,
/// so it never unwinds into the publishing thread.
pub(crate) fn apply<T, K, R>(continuation: K, resolved: Future<T>) -> Future<R::Target>
where
    T: Send + 'static,
    K: FnOnce(Future<T>) -> R,
    R: Futurize,
{
    match panic::catch_unwind(AssertUnwindSafe(move || continuation(resolved).futurize())) {
        Ok(future) => future,
        Err(payload) => {
            Future::from_outcome(Outcome::Error(Error::other(panic_message(payload.as_ref()))))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(&message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "continuation panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future::failed;

    #[test]
    fn ok_result_becomes_ready_value() {
        let mut future = Ok::<_, Error>(13).futurize();
        assert_eq!(future.get().unwrap(), 13);
    }

    #[test]
    fn err_result_carries_error_untranslated() {
        let mut future = Err::<i32, _>(Error::BrokenPromise).futurize();
        assert!(matches!(future.get(), Err(Error::BrokenPromise)));
    }

    #[test]
    fn unit_becomes_ready_unit() {
        let mut future = ().futurize();
        future.get().unwrap();
    }

    #[test]
    fn future_passes_through_flat() {
        let mut future = ready(42).futurize();
        assert_eq!(future.get().unwrap(), 42);
    }

    #[test]
    fn flattening_law_holds_through_then() {
        // ready(v).then(|_| ready(u)) observes u, not a nested handle.
        let mut chained = ready(1).then(|_f: Future<i32>| ready(2));
        assert_eq!(chained.get().unwrap(), 2);
    }

    #[test]
    fn failed_future_passes_through_flat() {
        let mut chained = ready(1).then(|_f: Future<i32>| failed::<i32>("inner"));
        assert_eq!(chained.get().unwrap_err().to_string(), "inner");
    }

    #[test]
    fn apply_captures_str_panic() {
        let mut future = apply(
            |_f: Future<()>| -> Result<i32, Error> { panic!("continuation exploded") },
            ready(()),
        );
        assert_eq!(future.get().unwrap_err().to_string(), "continuation exploded");
    }

    #[test]
    fn apply_captures_string_panic() {
        let mut future = apply(
            |_f: Future<()>| -> Result<i32, Error> {
                panic!("{}", String::from("formatted panic"))
            },
            ready(()),
        );
        assert_eq!(future.get().unwrap_err().to_string(), "formatted panic");
    }
}
