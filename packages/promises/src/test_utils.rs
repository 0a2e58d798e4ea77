//! Shared utilities for the test suites of this crate.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::future::Future;
use crate::promise::Promise;

/// Runs a test body with a 10-second timeout to prevent infinite hangs.
///
/// A test that deadlocks in a blocking wait would otherwise stall the whole
/// suite; this converts the hang into a panic with a useful message.
pub(crate) fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver already gave up on us.
        drop(tx.send(result));
    });

    match rx.recv_timeout(Duration::from_secs(10)) {
        Ok(result) => {
            test_handle.join().expect("test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded 10-second timeout - likely hanging in a blocking wait");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("test thread disconnected unexpectedly"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// A single worker thread that executes submitted closures in order.
///
/// This is the external collaborator the library itself never provides: the
/// tests use it to publish outcomes from a thread other than the attaching
/// one. Each submission returns a [`Future`] for the closure's return value,
/// so tests can also wait for the worker to finish a step.
pub(crate) struct WorkerThread {
    tasks: Option<mpsc::Sender<Box<dyn FnOnce() + Send>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl WorkerThread {
    pub(crate) fn new() -> Self {
        let (tasks, work) = mpsc::channel::<Box<dyn FnOnce() + Send>>();

        let thread = thread::spawn(move || {
            while let Ok(task) = work.recv() {
                task();
            }
        });

        Self {
            tasks: Some(tasks),
            thread: Some(thread),
        }
    }

    /// Submits a closure for execution and returns a future of its result.
    pub(crate) fn run<F, R>(&self, body: F) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut completion = Promise::new();
        let future = completion
            .future()
            .expect("a fresh promise has not handed out its consumer");

        self.tasks
            .as_ref()
            .expect("worker accepts tasks until dropped")
            .send(Box::new(move || {
                let _ = completion.set_value(body());
            }))
            .expect("worker thread is running");

        future
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        // Closing the channel lets the worker loop exit.
        drop(self.tasks.take());
        if let Some(thread) = self.thread.take() {
            thread.join().expect("worker thread panicked");
        }
    }
}
