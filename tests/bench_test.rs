//! Benchmark tests for critical operations
//!
//! Run with: cargo test --release -- --nocapture bench

use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

use linkvault::allocator::{Allocator, RandomCodeSource};
use linkvault::analytics::daily_histogram;
use linkvault::database::Store;
use linkvault::recorder::record_click;

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(usize),
{
    let start = Instant::now();

    for i in 0..iterations {
        f(i);
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_millis() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

fn setup() -> (Arc<Store>, Allocator, NamedTempFile) {
    let temp_db = NamedTempFile::new().unwrap();
    let store = Arc::new(Store::open(temp_db.path().to_str().unwrap()).unwrap());
    let allocator = Allocator::new(store.clone(), Arc::new(RandomCodeSource::default()));
    (store, allocator, temp_db)
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_allocate() {
    println!("\n=== Benchmark: Allocate ===\n");

    let (_store, allocator, _temp_db) = setup();

    benchmark("Allocate fresh links", 1000, |i| {
        allocator
            .allocate(&format!("https://example.com/bench{}", i), "bench_user")
            .unwrap();
    });

    // Dedup hits scan the owner's index
    benchmark("Allocate existing links", 1000, |i| {
        allocator
            .allocate(&format!("https://example.com/bench{}", i), "bench_user")
            .unwrap();
    });
}

#[test]
#[ignore]
fn bench_record_clicks() {
    println!("\n=== Benchmark: Record clicks ===\n");

    let (store, allocator, _temp_db) = setup();
    let mut link = allocator
        .allocate("https://example.com/hot", "bench_user")
        .unwrap();

    // Past 1000 clicks every write also evicts the oldest record
    benchmark("Record click", 2000, |i| {
        link = record_click(&store, &link, "bench-agent/1.0", &i.to_string()).unwrap();
    });

    let start = Instant::now();
    let histogram = daily_histogram(&link);
    println!("  Histogram over {} clicks: {:?}", link.clicks.len(), start.elapsed());
    println!("  Days: {}\n", histogram.len());
}

#[test]
#[ignore]
fn bench_concurrent_allocations() {
    println!("\n=== Benchmark: Concurrent Allocations ===\n");

    let (_store, allocator, _temp_db) = setup();

    let num_threads = 16;
    let ops_per_thread = 50;

    let start = Instant::now();
    std::thread::scope(|s| {
        for thread_id in 0..num_threads {
            let allocator = &allocator;
            s.spawn(move || {
                for op_id in 0..ops_per_thread {
                    allocator
                        .allocate(
                            &format!("https://example.com/concurrent-{}-{}", thread_id, op_id),
                            &format!("user_{}", thread_id),
                        )
                        .unwrap();
                }
            });
        }
    });
    let duration = start.elapsed();

    let total_ops = num_threads * ops_per_thread;
    println!("  Total operations: {}", total_ops);
    println!("  Total time: {:?}", duration);
    println!(
        "  Throughput: {:.0} ops/sec\n",
        total_ops as f64 / duration.as_secs_f64()
    );
}
