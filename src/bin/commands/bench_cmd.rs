use anyhow::{Context, Result};
use datx::{Database, LoadMode};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli_utils::{format_number, format_qps};

pub fn cmd_bench(database: PathBuf, count: usize, cache_size: usize, no_mmap: bool) -> Result<()> {
    let mode = if no_mmap { LoadMode::Read } else { LoadMode::Mmap };

    println!("--- Phase 1: Load Database ({}) ---", if no_mmap { "read" } else { "mmap" });
    let load_start = Instant::now();
    let db = Database::from(database.clone())
        .load_mode(mode)
        .cache_capacity(cache_size)
        .eager()
        .open()
        .with_context(|| format!("Failed to load database: {}", database.display()))?;
    let load_time = load_start.elapsed();
    println!("  Load time:   {:.3}ms", load_time.as_micros() as f64 / 1000.0);
    println!();

    println!("--- Phase 2: Query Performance ---");
    let bench_start = Instant::now();
    let mut found = 0usize;
    for i in 0..count {
        // Multiplicative hash spreads consecutive i across the address space
        let ip = Ipv4Addr::from((i as u32).wrapping_mul(2_654_435_761));
        if db.lookup_v4(ip)?.is_some() {
            found += 1;
        }
    }
    let bench_time = bench_start.elapsed();
    let qps = count as f64 / bench_time.as_secs_f64().max(f64::EPSILON);
    let avg_ns = bench_time.as_nanos() as f64 / count.max(1) as f64;

    println!("  Query count: {}", format_number(count));
    println!("  Total time:  {:.2}s", bench_time.as_secs_f64());
    println!("  QPS:         {} queries/sec", format_qps(qps));
    println!("  Avg latency: {:.2}µs", avg_ns / 1000.0);
    println!("  Found:       {}/{}", format_number(found), format_number(count));

    if cache_size > 0 {
        let stats = db.stats();
        println!("  Cache hits:  {:.1}%", stats.cache_hit_rate() * 100.0);
    }
    println!();
    println!("✓ Benchmark complete");

    Ok(())
}
