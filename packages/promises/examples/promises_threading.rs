//! Cross-thread usage: a worker thread publishes while the main thread
//! polls, times out, and finally blocks for the outcome.

use std::thread;
use std::time::Duration;

use promises::{Promise, WaitStatus};

fn main() {
    let mut promise = Promise::<String>::new();
    let mut future = promise.future().unwrap();

    let publisher = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        promise.set_value("prepared on the worker".to_string()).unwrap();
    });

    match future.wait_for(Duration::from_millis(1)) {
        WaitStatus::Ready => println!("outcome arrived early"),
        WaitStatus::Timeout => println!("still pending after 1 ms, blocking now"),
        WaitStatus::Deferred => unreachable!("never produced"),
    }

    println!("outcome: {}", future.get().unwrap());
    publisher.join().unwrap();
}
