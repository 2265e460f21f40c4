//! Many coroutines printing their index between yields.
//!
//! Run with `cargo run --example interleave`. Set `COSTACK_DEBUG=1` to see
//! every switch.

use costack::{RuntimeBuilder, yield_now};

const COROUTINES: usize = 100;
const ROUNDS: usize = 5;

fn main() -> costack::Result<()> {
    let runtime = RuntimeBuilder::new().build()?;

    let handles = (0..COROUTINES)
        .map(|i| {
            runtime.spawn(
                "co",
                |i: usize| {
                    for _ in 0..ROUNDS {
                        print!("{i} ");
                        if let Err(err) = yield_now() {
                            eprintln!("coroutine {i}: {err}");
                            return;
                        }
                    }
                },
                i,
            )
        })
        .collect::<costack::Result<Vec<_>>>()?;

    println!("spawned {} coroutines, capacity {}", handles.len(), runtime.capacity());

    for handle in handles {
        runtime.wait(handle)?;
    }

    println!();
    println!("all coroutines joined");

    Ok(())
}
