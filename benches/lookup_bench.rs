use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use datx::Database;
use std::hint::black_box;
use std::io::Write;
use std::net::Ipv4Addr;
use std::time::Duration;

const FIRST_LEVEL_INDEX_SIZE: usize = 256 * 1024;

/// datx bytes with `count` evenly spaced ranges covering the address space
fn build_datx(count: u32) -> Vec<u8> {
    let step = u32::MAX / count;
    let ends: Vec<u32> = (1..=count).map(|i| if i == count { u32::MAX } else { i * step }).collect();

    let total_offset = (4 + 2 * FIRST_LEVEL_INDEX_SIZE + ends.len() * 9) as u32;
    let mut file = Vec::with_capacity(total_offset as usize + ends.len() * 16);
    file.extend_from_slice(&total_offset.to_be_bytes());

    let mut next = 0usize;
    for slot in 0..(256 * 256u32) {
        while next < ends.len() && ends[next] < slot << 16 {
            next += 1;
        }
        file.extend_from_slice(&(next as u32).to_le_bytes());
    }

    let mut payloads = Vec::new();
    for end in &ends {
        let payload = format!("range\t{}\t{}", Ipv4Addr::from(*end), end % 97);
        let offset = (FIRST_LEVEL_INDEX_SIZE + payloads.len()) as u32;
        file.extend_from_slice(&end.to_be_bytes());
        file.extend_from_slice(&offset.to_le_bytes()[..3]);
        file.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        payloads.extend_from_slice(payload.as_bytes());
    }
    file.extend_from_slice(&vec![0u8; FIRST_LEVEL_INDEX_SIZE]);
    file.extend_from_slice(&payloads);
    file
}

fn queries(n: u32) -> Vec<Ipv4Addr> {
    (0..n).map(|i| Ipv4Addr::from(i.wrapping_mul(2_654_435_761))).collect()
}

/// Lookup cost as the number of ranges grows
fn bench_lookup_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_scaling");
    group.measurement_time(Duration::from_secs(5));
    let probes = queries(1000);

    for count in [1_000u32, 10_000, 250_000] {
        let db = Database::from_bytes(build_datx(count)).unwrap();
        group.throughput(Throughput::Elements(probes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &db, |b, db| {
            b.iter(|| {
                for ip in &probes {
                    black_box(db.lookup_v4(*ip).unwrap());
                }
            })
        });
    }
    group.finish();
}

/// Cold mmap file vs cached results on a repeating query set
fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    let mut file = tempfile::NamedTempFile::with_suffix(".datx").unwrap();
    file.write_all(&build_datx(100_000)).unwrap();
    file.flush().unwrap();

    let probes: Vec<String> = queries(100).iter().map(|ip| ip.to_string()).collect();

    for (name, capacity) in [("no_cache", 0usize), ("lru_10k", 10_000)] {
        let db = Database::from(file.path())
            .cache_capacity(capacity)
            .eager()
            .open()
            .unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                for q in &probes {
                    black_box(db.find(q).unwrap());
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lookup_scaling, bench_cache);
criterion_main!(benches);
