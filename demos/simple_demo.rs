//! Simple demo
//!
//! Shows level filtering, changing the level at runtime and a multi-threaded
//! throughput run through the async pipeline.
//!
//! Run with: cargo run --example simple_demo [log_dir]

use std::thread;
use std::time::{Duration, Instant};
use xyz_log::prelude::*;

const ITERATIONS: u32 = 100_000;
const THREADS: u32 = 4;

fn benchmark(name: &str, iterations: u32, mut f: impl FnMut()) -> Duration {
    for _ in 0..1000 {
        f();
    }
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    let elapsed = start.elapsed();
    println!(
        "{}: {:.3} us/op (total: {:?} for {} iterations)",
        name,
        elapsed.as_secs_f64() * 1e6 / f64::from(iterations),
        elapsed,
        iterations
    );
    elapsed
}

fn main() -> Result<()> {
    println!("=== xyz_log - Simple Demo ===\n");

    let mut options = LoggerOptions::new("my_demo")
        .with_console(false)
        .with_async(true)
        .with_multi_thread(true)
        .with_level(LogLevel::Debug)
        .with_max_log_size(10 * 1024 * 1024);
    if let Some(dir) = std::env::args().nth(1) {
        options = options.with_log_dir(dir);
    }
    Logger::init(options)?;

    println!("1. Level filtering (minimum {}):", Logger::get_level());
    trace!() << "This TRACE message is filtered";
    debug!() << "This DEBUG message is written";
    info!() << "This INFO message is written";
    warning!() << "This WARNING message is written";

    Logger::set_level(LogLevel::Warning);
    println!("\n2. Minimum raised to {}:", Logger::get_level());
    debug!() << "This DEBUG message is filtered";
    info!() << "This INFO message is filtered";
    warning!() << "This WARNING message is written";
    error!("This ERROR message is written ({} of {})", 2, 2);

    Logger::set_level(LogLevel::Info);

    println!("\n3. Single-thread throughput:");
    let test_msg = "Test message with value: ";
    let test_value = 42;
    benchmark("  log!(Info)", ITERATIONS, || {
        log!(Info) << test_msg << test_value;
    });
    benchmark("  debug!() (filtered)", ITERATIONS, || {
        debug!() << test_msg << test_value;
    });

    println!("\n4. Multi-thread throughput ({} threads, {} records each):", THREADS, ITERATIONS);
    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    info!() << "Thread " << t << " - Message " << i;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer thread panicked");
    }
    Logger::flush()?;
    let elapsed = start.elapsed();
    let total = f64::from(THREADS * ITERATIONS);
    println!(
        "  {:.0} records/s ({:.3} us/op)",
        total / elapsed.as_secs_f64(),
        elapsed.as_secs_f64() * 1e6 / total
    );

    if let Some(metrics) = Logger::metrics() {
        println!(
            "\n  submitted={} delivered={} queue_full_events={}",
            metrics.submitted(),
            metrics.delivered(),
            metrics.queue_full_events()
        );
    }
    if let Some(file) = Logger::current_log_file() {
        println!("\nCheck '{}' for file output", file.display());
    }

    Logger::shutdown();
    println!("\n=== Demo completed successfully! ===");
    Ok(())
}
