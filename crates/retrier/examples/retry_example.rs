//! Example: retrying a flaky operation with exponential backoff
//!
//! This example demonstrates:
//! 1. The one-call `retry` helper
//! 2. Exhaustion and the wrapped error
//! 3. Keeping the trailing sleep for the older timing
//!
//! Run with:
//! ```bash
//! cargo run -p retrier --example retry_example
//! ```

use retrier::prelude::*;
use std::time::{Duration, Instant};

/// A simulated service that fails the first few times
struct UnreliableService {
    calls: u32,
    fail_count: u32,
}

impl UnreliableService {
    fn new(fail_count: u32) -> Self {
        Self {
            calls: 0,
            fail_count,
        }
    }

    fn call(&mut self) -> Result<(), std::io::Error> {
        self.calls += 1;

        if self.calls <= self.fail_count {
            println!("  Attempt {}: FAILED", self.calls);
            Err(std::io::Error::other(format!(
                "transient error on attempt {}",
                self.calls
            )))
        } else {
            println!("  Attempt {}: SUCCESS", self.calls);
            Ok(())
        }
    }
}

fn main() {
    println!("1. Recovering after two failures (budget 4, base 50ms)");
    let mut service = UnreliableService::new(2);
    let start = Instant::now();
    match retry(4, Duration::from_millis(50), || service.call()) {
        Ok(()) => println!("  Succeeded after {:?}\n", start.elapsed()),
        Err(e) => println!("  Unexpected failure: {}\n", e),
    }

    println!("2. Giving up (budget 3, base 50ms)");
    let mut service = UnreliableService::new(10);
    let start = Instant::now();
    if let Err(e) = retry(3, Duration::from_millis(50), || service.call()) {
        println!("  {} (after {:?})\n", e, start.elapsed());
    }

    println!("3. Same failure with trailing sleep, timed with a fake clock");
    let sleeper = RecordingSleeper::new();
    let retrier = Retrier::builder()
        .attempts(3)
        .base_delay(Duration::from_millis(50))
        .trailing_sleep(true)
        .sleeper(sleeper.clone())
        .build();
    let mut service = UnreliableService::new(10);
    let _ = retrier.run(|| service.call());
    println!("  Requested sleeps: {:?}", sleeper.recorded());
    println!("  Total backoff:    {:?}", retrier.total_backoff());
}
