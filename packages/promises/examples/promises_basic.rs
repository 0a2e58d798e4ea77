//! Basic usage: publish a value through a promise and chain a continuation.

use promises::{Error, Future, Promise};

fn main() {
    let mut promise = Promise::<i32>::new();
    let future = promise.future().unwrap();

    let mut doubled = future.then(|mut f: Future<i32>| -> Result<i32, Error> { Ok(f.get()? * 2) });

    promise.set_value(21).unwrap();

    println!("doubled outcome: {}", doubled.get().unwrap());
}
