//! The wait-any combinator: a future of the first input to resolve.

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::cell::Outcome;
use crate::future::Future;
use crate::promise::Promise;

mod sealed {
    pub trait Sealed {}
}

/// A tuple of consumer handles that [`any`] can race against each other.
///
/// Implemented for tuples of up to six futures with heterogeneous outcome
/// types. Sealed; the tuple implementations are the complete set.
pub trait AnyFutures: sealed::Sealed {
    /// The tuple of handles produced when the first input resolves.
    type Resolved: Send + 'static;

    #[doc(hidden)]
    fn select(self) -> Future<Self::Resolved>;
}

/// Awaits the first future in the tuple to resolve.
///
/// The produced future resolves exactly once, as soon as any input resolves,
/// with a tuple holding the winning input's resolved handle in its slot.
/// The slots of the other inputs are vacant handles reporting
/// `ready() == false`.
///
/// An input resolving with an error still wins the race; the error stays
/// inside its slot for the consumer to inspect.
///
/// # Example
///
/// ```rust
/// use promises::{Promise, any};
///
/// let mut slow = Promise::<i32>::new();
/// let mut fast = Promise::<i32>::new();
///
/// let mut aggregate = any((slow.future().unwrap(), fast.future().unwrap()));
/// fast.set_value(42).unwrap();
///
/// let (first, mut second) = aggregate.get().unwrap();
/// assert!(!first.ready());
/// assert_eq!(second.get().unwrap(), 42);
/// ```
#[must_use]
pub fn any<L>(futures: L) -> Future<L::Resolved>
where
    L: AnyFutures,
{
    futures.select()
}

/// Awaits the first future produced by an iterator to resolve.
///
/// The produced future resolves with the full sequence of slots, the winner
/// resolved in place and every other slot vacant. An empty sequence can
/// never choose a winner and reports a broken promise.
#[must_use]
pub fn any_of<T, I>(futures: I) -> Future<Vec<Future<T>>>
where
    T: Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    struct Context<T>
    where
        T: Send + 'static,
    {
        chosen: AtomicBool,
        slots: Mutex<Vec<Future<T>>>,
        aggregate: Mutex<Option<Promise<Vec<Future<T>>>>>,
    }

    let futures: Vec<Future<T>> = futures.into_iter().collect();

    let mut aggregate = Promise::new();
    let future = aggregate
        .future()
        .expect("a fresh promise has not handed out its consumer");

    let context = Arc::new(Context {
        chosen: AtomicBool::new(false),
        slots: Mutex::new((0..futures.len()).map(|_| Future::default()).collect()),
        aggregate: Mutex::new(Some(aggregate)),
    });

    for (index, input) in futures.into_iter().enumerate() {
        let context = Arc::clone(&context);
        let _ = input.then(move |resolved: Future<T>| {
            // First arrival wins; everyone else observes the flag and leaves
            // their slot vacant.
            if context.chosen.swap(true, Ordering::SeqCst) {
                return;
            }

            let mut slots = context.slots.lock();
            slots[index] = resolved;
            let resolved_slots = mem::take(&mut *slots);
            drop(slots);

            if let Some(aggregate) = context.aggregate.lock().take() {
                aggregate.publish(Outcome::Value(resolved_slots));
            }
        });
    }

    future
}

impl sealed::Sealed for () {}

impl AnyFutures for () {
    type Resolved = ();

    fn select(self) -> Future<()> {
        // No input can ever resolve the aggregate.
        let mut aggregate = Promise::<()>::new();
        let future = aggregate
            .future()
            .expect("a fresh promise has not handed out its consumer");
        drop(aggregate);
        future
    }
}

macro_rules! any_futures {
    ($($t:ident $f:ident $index:tt),+) => {
        impl<$($t),+> sealed::Sealed for ($(Future<$t>,)+)
        where
            $($t: Send + 'static),+
        {
        }

        impl<$($t),+> AnyFutures for ($(Future<$t>,)+)
        where
            $($t: Send + 'static),+
        {
            type Resolved = ($(Future<$t>,)+);

            fn select(self) -> Future<Self::Resolved> {
                struct Context<$($t),+>
                where
                    $($t: Send + 'static),+
                {
                    chosen: AtomicBool,
                    slots: Mutex<($(Future<$t>,)+)>,
                    aggregate: Mutex<Option<Promise<($(Future<$t>,)+)>>>,
                }

                let mut aggregate = Promise::new();
                let future = aggregate
                    .future()
                    .expect("a fresh promise has not handed out its consumer");

                let context = Arc::new(Context {
                    chosen: AtomicBool::new(false),
                    slots: Mutex::new(($(Future::<$t>::default(),)+)),
                    aggregate: Mutex::new(Some(aggregate)),
                });

                let ($($f,)+) = self;
                $(
                    {
                        let context = Arc::clone(&context);
                        let _ = $f.then(move |resolved: Future<$t>| {
                            if context.chosen.swap(true, Ordering::SeqCst) {
                                return;
                            }

                            let mut slots = context.slots.lock();
                            slots.$index = resolved;
                            let resolved_slots = mem::take(&mut *slots);
                            drop(slots);

                            if let Some(aggregate) = context.aggregate.lock().take() {
                                aggregate.publish(Outcome::Value(resolved_slots));
                            }
                        });
                    }
                )+

                future
            }
        }
    };
}

any_futures!(T0 f0 0);
any_futures!(T0 f0 0, T1 f1 1);
any_futures!(T0 f0 0, T1 f1 1, T2 f2 2);
any_futures!(T0 f0 0, T1 f1 1, T2 f2 2, T3 f3 3);
any_futures!(T0 f0 0, T1 f1 1, T2 f2 2, T3 f3 3, T4 f4 4);
any_futures!(T0 f0 0, T1 f1 1, T2 f2 2, T3 f3 3, T4 f4 4, T5 f5 5);
