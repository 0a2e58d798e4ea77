//! The wait-all combinator: a future of every input's resolved handle.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cell::Outcome;
use crate::future::{Future, ready};
use crate::promise::Promise;

mod sealed {
    pub trait Sealed {}
}

/// A tuple of consumer handles that [`all`] can await together.
///
/// Implemented for tuples of up to six futures with heterogeneous outcome
/// types. Sealed; the tuple implementations are the complete set.
pub trait AllFutures: sealed::Sealed {
    /// The tuple of resolved handles produced once every input has resolved.
    type Resolved: Send + 'static;

    #[doc(hidden)]
    fn join(self) -> Future<Self::Resolved>;
}

/// Awaits every future in the tuple.
///
/// The produced future resolves once all inputs have resolved, with a tuple
/// of the resolved input handles in input order. Erroring inputs do not
/// short-circuit the aggregate: each slot keeps its own outcome for the
/// consumer to claim.
///
/// # Example
///
/// ```rust
/// use promises::{all, failed, ready};
///
/// let mut aggregate = all((ready(13), ready(true), failed::<i32>("late")));
///
/// let (mut x, mut y, mut z) = aggregate.get().unwrap();
/// assert_eq!(x.get().unwrap(), 13);
/// assert!(y.get().unwrap());
/// assert!(z.get().is_err());
/// ```
#[must_use]
pub fn all<L>(futures: L) -> Future<L::Resolved>
where
    L: AllFutures,
{
    futures.join()
}

/// Awaits every future produced by an iterator.
///
/// The produced future resolves once all inputs have resolved, with the
/// resolved handles in iteration order. An empty sequence resolves
/// immediately with an empty vector.
///
/// # Example
///
/// ```rust
/// use promises::{all_of, ready};
///
/// let mut aggregate = all_of((1..=3).map(ready));
///
/// for (index, mut slot) in aggregate.get().unwrap().into_iter().enumerate() {
///     assert_eq!(slot.get().unwrap(), index as i32 + 1);
/// }
/// ```
#[must_use]
pub fn all_of<T, I>(futures: I) -> Future<Vec<Future<T>>>
where
    T: Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    struct Context<T>
    where
        T: Send + 'static,
    {
        slots: Mutex<Vec<Future<T>>>,
        aggregate: Mutex<Option<Promise<Vec<Future<T>>>>>,
    }

    // The last continuation to finish drops the last shared owner, which is
    // the moment every slot is in place.
    impl<T> Drop for Context<T>
    where
        T: Send + 'static,
    {
        fn drop(&mut self) {
            let slots = mem::take(self.slots.get_mut());
            if let Some(aggregate) = self.aggregate.get_mut().take() {
                aggregate.publish(Outcome::Value(slots));
            }
        }
    }

    let futures: Vec<Future<T>> = futures.into_iter().collect();

    let mut aggregate = Promise::new();
    let future = aggregate
        .future()
        .expect("a fresh promise has not handed out its consumer");

    let context = Arc::new(Context {
        slots: Mutex::new((0..futures.len()).map(|_| Future::default()).collect()),
        aggregate: Mutex::new(Some(aggregate)),
    });

    for (index, input) in futures.into_iter().enumerate() {
        let context = Arc::clone(&context);
        let _ = input.then(move |resolved: Future<T>| {
            context.slots.lock()[index] = resolved;
        });
    }

    future
}

impl sealed::Sealed for () {}

impl AllFutures for () {
    type Resolved = ();

    fn join(self) -> Future<()> {
        ready(())
    }
}

macro_rules! all_futures {
    ($($t:ident $f:ident $index:tt),+) => {
        impl<$($t),+> sealed::Sealed for ($(Future<$t>,)+)
        where
            $($t: Send + 'static),+
        {
        }

        impl<$($t),+> AllFutures for ($(Future<$t>,)+)
        where
            $($t: Send + 'static),+
        {
            type Resolved = ($(Future<$t>,)+);

            fn join(self) -> Future<Self::Resolved> {
                struct Context<$($t),+>
                where
                    $($t: Send + 'static),+
                {
                    slots: Mutex<($(Option<Future<$t>>,)+)>,
                    aggregate: Mutex<Option<Promise<($(Future<$t>,)+)>>>,
                }

                impl<$($t),+> Drop for Context<$($t),+>
                where
                    $($t: Send + 'static),+
                {
                    fn drop(&mut self) {
                        let slots = mem::take(self.slots.get_mut());
                        let resolved = ($(slots.$index.unwrap_or_default(),)+);
                        if let Some(aggregate) = self.aggregate.get_mut().take() {
                            aggregate.publish(Outcome::Value(resolved));
                        }
                    }
                }

                let mut aggregate = Promise::new();
                let future = aggregate
                    .future()
                    .expect("a fresh promise has not handed out its consumer");

                let context = Arc::new(Context {
                    slots: Mutex::new(($(Option::<Future<$t>>::None,)+)),
                    aggregate: Mutex::new(Some(aggregate)),
                });

                let ($($f,)+) = self;
                $(
                    {
                        let context = Arc::clone(&context);
                        let _ = $f.then(move |resolved: Future<$t>| {
                            context.slots.lock().$index = Some(resolved);
                        });
                    }
                )+

                future
            }
        }
    };
}

all_futures!(T0 f0 0);
all_futures!(T0 f0 0, T1 f1 1);
all_futures!(T0 f0 0, T1 f1 1, T2 f2 2);
all_futures!(T0 f0 0, T1 f1 1, T2 f2 2, T3 f3 3);
all_futures!(T0 f0 0, T1 f1 1, T2 f2 2, T3 f3 3, T4 f4 4);
all_futures!(T0 f0 0, T1 f1 1, T2 f2 2, T3 f3 3, T4 f4 4, T5 f5 5);

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::error::Error;
    use crate::future::failed;
    use crate::test_utils::{WorkerThread, with_watchdog};

    #[test]
    fn empty_tuple_resolves_immediately() {
        let mut aggregate = all(());
        assert!(aggregate.ready());
        aggregate.get().unwrap();
    }

    #[test]
    fn resolved_inputs_resolve_immediately() {
        let mut aggregate = all((ready(1), ready("two")));
        assert!(aggregate.ready());

        let (mut x, mut y) = aggregate.get().unwrap();
        assert_eq!(x.get().unwrap(), 1);
        assert_eq!(y.get().unwrap(), "two");
    }

    #[test]
    fn aggregate_waits_for_every_input() {
        let mut first = Promise::new();
        let mut second = Promise::new();
        let aggregate = all((first.future().unwrap(), second.future().unwrap()));

        first.set_value(1).unwrap();
        assert!(!aggregate.ready());

        second.set_value(2).unwrap();
        assert!(aggregate.ready());
    }

    #[test]
    fn erroring_input_does_not_short_circuit() {
        let mut first = Promise::new();
        let mut second = Promise::new();
        let mut third = Promise::<()>::new();

        let mut aggregate = all((
            first.future().unwrap(),
            second.future().unwrap(),
            third.future().unwrap(),
        ));

        first.set_value(13).unwrap();
        second.set_value(true).unwrap();
        third.set_error("test").unwrap();

        let (mut x, mut y, mut z) = aggregate.get().unwrap();
        assert_eq!(x.get().unwrap(), 13);
        assert!(y.get().unwrap());
        assert_eq!(z.get().unwrap_err().to_string(), "test");
    }

    #[test]
    fn broken_input_fills_its_slot() {
        let mut kept = Promise::new();
        let mut dropped = Promise::<i32>::new();
        let abandoned = dropped.future().unwrap();
        let mut aggregate = all((kept.future().unwrap(), abandoned));

        kept.set_value(1).unwrap();
        drop(dropped);

        let (mut x, mut y) = aggregate.get().unwrap();
        assert_eq!(x.get().unwrap(), 1);
        assert!(matches!(y.get(), Err(Error::BrokenPromise)));
    }

    #[test]
    fn cross_thread_resolution() {
        with_watchdog(|| {
            let worker = WorkerThread::new();
            let mut first = Promise::new();
            let mut second = Promise::new();
            let mut aggregate = all((first.future().unwrap(), second.future().unwrap()));

            let mut running = worker.run(move || {
                thread::sleep(Duration::from_millis(1));
                first.set_value(1).unwrap();
                second.set_value(2).unwrap();
            });
            running.get().unwrap();

            let (mut x, mut y) = aggregate.get().unwrap();
            assert_eq!(x.get().unwrap() + y.get().unwrap(), 3);
        });
    }

    #[test]
    fn all_of_preserves_iteration_order() {
        let mut promises: Vec<Promise<i32>> = (0..3).map(|_| Promise::new()).collect();
        let futures: Vec<_> = promises
            .iter_mut()
            .map(|p| p.future().unwrap())
            .collect();

        let mut aggregate = all_of(futures);

        for (index, promise) in promises.iter_mut().enumerate() {
            promise.set_value(index as i32 + 1).unwrap();
        }

        let slots = aggregate.get().unwrap();
        assert_eq!(slots.len(), 3);
        for (index, mut slot) in slots.into_iter().enumerate() {
            assert_eq!(slot.get().unwrap(), index as i32 + 1);
        }
    }

    #[test]
    fn all_of_empty_sequence_resolves_immediately() {
        let mut aggregate = all_of(Vec::<Future<i32>>::new());
        assert!(aggregate.ready());
        assert!(aggregate.get().unwrap().is_empty());
    }

    #[test]
    fn all_of_keeps_error_slots() {
        let mut aggregate = all_of(vec![ready(1), failed::<i32>("slot error")]);

        let mut slots = aggregate.get().unwrap();
        assert_eq!(slots[0].get().unwrap(), 1);
        assert_eq!(slots[1].get().unwrap_err().to_string(), "slot error");
    }
}
