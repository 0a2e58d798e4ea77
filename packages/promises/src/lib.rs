//! Composable eventual values: producer/consumer handle pairs that deliver a
//! single outcome and compose through continuation attachment.
//!
//! A [`Promise`] publishes exactly one outcome - a value or an error - and
//! hands out exactly one [`Future`] for it. The consumer side can block for
//! the outcome ([`Future::get`]), poll its readiness ([`Future::ready`],
//! [`Future::wait_for`]), or attach a continuation ([`Future::then`]) that
//! receives the resolved handle whenever the outcome arrives. Continuations
//! run exactly once, inline on whichever thread publishes the outcome (or on
//! the attaching thread when the outcome is already present) - the crate
//! never owns threads of its own.
//!
//! Ready-made outcomes come from [`ready`] and [`failed`] without allocating
//! any shared state. The [`all`] and [`any`] combinators (plus their
//! iterator forms [`all_of`] and [`any_of`]) aggregate a set of futures into
//! one future of resolved handles.
//!
//! # Publishing and claiming
//!
//! ```rust
//! use promises::Promise;
//!
//! let mut promise = Promise::<i32>::new();
//! let mut future = promise.future().unwrap();
//!
//! promise.set_value(42).unwrap();
//! assert_eq!(future.get().unwrap(), 42);
//! ```
//!
//! # Chaining continuations
//!
//! A continuation receives the resolved input handle and returns either a
//! `Result` (value-or-raise), a unit, or another future (which is flattened
//! into the chain):
//!
//! ```rust
//! use promises::{Error, Future, ready};
//!
//! let mut chained = ready(2)
//!     .then(|mut f: Future<i32>| -> Result<i32, Error> { Ok(f.get()? * 10) })
//!     .then(|mut f: Future<i32>| ready(f.get().unwrap() + 22));
//!
//! assert_eq!(chained.get().unwrap(), 42);
//! ```
//!
//! # Cross-thread resolution
//!
//! ```rust
//! use std::thread;
//!
//! use promises::Promise;
//!
//! let mut promise = Promise::<String>::new();
//! let mut future = promise.future().unwrap();
//!
//! let publisher = thread::spawn(move || {
//!     promise.set_value("from elsewhere".to_string()).unwrap();
//! });
//!
//! assert_eq!(future.get().unwrap(), "from elsewhere");
//! publisher.join().unwrap();
//! ```

mod all;
mod any;
mod cell;
mod error;
mod future;
mod futurize;
mod promise;
#[cfg(test)]
mod test_utils;

pub use all::{AllFutures, all, all_of};
pub use any::{AnyFutures, any, any_of};
pub use error::Error;
pub use future::{Future, WaitStatus, failed, ready};
pub use futurize::Futurize;
pub use promise::Promise;
