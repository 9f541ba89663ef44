//! Benchmarks for SPSC queue performance.
//!
//! Compares lattice-queue against crossbeam-queue's ArrayQueue.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use crossbeam_queue::ArrayQueue;
use lattice_queue::spsc;
use std::thread;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
struct Medium([u64; 16]); // 128 bytes

// ============================================================================
// Single-threaded latency benchmarks
// ============================================================================

fn bench_single_thread_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_single_thread_latency");

    group.bench_function("lattice_spsc/u64", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);
        b.iter(|| {
            tx.push(black_box(42)).unwrap();
            black_box(rx.pop().unwrap())
        });
    });

    group.bench_function("crossbeam_array/u64", |b| {
        let q = ArrayQueue::<u64>::new(1024);
        b.iter(|| {
            q.push(black_box(42)).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    group.bench_function("lattice_spsc/128b", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<Medium>(1024);
        let msg = Medium([0; 16]);
        b.iter(|| {
            tx.push(black_box(msg)).unwrap();
            black_box(rx.pop().unwrap())
        });
    });

    group.finish();
}

// ============================================================================
// Ranged operations
// ============================================================================

fn bench_ranged(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_ranged");
    group.throughput(Throughput::Elements(64));

    group.bench_function("push_slice_pop_slice/64", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);
        let batch: Vec<u64> = (0..64).collect();
        let mut out = [0u64; 64];
        b.iter(|| {
            assert!(tx.try_push_slice(black_box(&batch)));
            assert!(rx.try_pop_slice(black_box(&mut out)));
        });
    });

    group.bench_function("push_pop_singly/64", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);
        b.iter(|| {
            for i in 0..64u64 {
                tx.push(black_box(i)).unwrap();
            }
            for _ in 0..64 {
                black_box(rx.pop().unwrap());
            }
        });
    });

    group.finish();
}

// ============================================================================
// Cross-thread throughput
// ============================================================================

fn bench_cross_thread_throughput(c: &mut Criterion) {
    const COUNT: u64 = 100_000;

    let mut group = c.benchmark_group("spsc_cross_thread_throughput");
    group.throughput(Throughput::Elements(COUNT));
    group.sample_size(20);

    group.bench_function("lattice_spsc/u64", |b| {
        b.iter(|| {
            let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);

            let producer = thread::spawn(move || {
                for i in 0..COUNT {
                    while tx.push(i).is_err() {
                        std::hint::spin_loop();
                    }
                }
            });

            let mut received = 0u64;
            while received < COUNT {
                if rx.pop().is_some() {
                    received += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
            producer.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_latency,
    bench_ranged,
    bench_cross_thread_throughput
);
criterion_main!(benches);
