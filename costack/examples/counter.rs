//! Three coroutines sharing a counter, each yielding five times.
//!
//! Run with `cargo run --example counter [seed]`.

use costack::{RuntimeBuilder, yield_now};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const WORKERS: usize = 3;
const YIELDS: u32 = 5;

fn main() -> costack::Result<()> {
    let mut builder = RuntimeBuilder::new();
    if let Some(seed) = std::env::args().nth(1).and_then(|s| s.parse().ok()) {
        builder = builder.seed(seed);
    }
    let runtime = builder.build()?;

    let counter = Rc::new(Cell::new(0u32));
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut handles = Vec::with_capacity(WORKERS);
    for worker in 0..WORKERS {
        let counter = counter.clone();
        let order = order.clone();

        handles.push(runtime.spawn(
            "counter",
            move |worker: usize| {
                for _ in 0..YIELDS {
                    counter.set(counter.get() + 1);
                    order.borrow_mut().push(worker);
                    if yield_now().is_err() {
                        return;
                    }
                }
            },
            worker,
        )?);
    }

    for handle in handles {
        runtime.wait(handle)?;
    }

    println!("final count: {}", counter.get());
    println!("turn order:  {:?}", order.borrow());

    Ok(())
}
