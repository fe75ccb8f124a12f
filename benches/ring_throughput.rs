//! Benchmarks for the SPSC ring
//!
//! Measures the producer/consumer hot paths:
//! - Single push + pop on one thread (no contention)
//! - Batched fill and drain at several capacities
//! - Cross-thread streaming with a producer and consumer on separate cores

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sensorlink::RingBuffer;
use sensorlink::test_utils::{event, full_event};
use std::hint::black_box;

fn bench_push_pop(c: &mut Criterion) {
    let mut ring = RingBuffer::new(1024).expect("ring allocation");
    let (mut producer, mut consumer) = ring.split();
    let record = full_event(1);

    c.bench_function("ring_push_pop_single", |b| {
        b.iter(|| {
            producer.push(black_box(record));
            black_box(consumer.pop())
        })
    });
}

fn bench_fill_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_fill_drain");

    for capacity in [64usize, 1024, 16_384] {
        let mut ring = RingBuffer::new(capacity).expect("ring allocation");
        let (mut producer, mut consumer) = ring.split();
        group.throughput(Throughput::Elements(capacity as u64));

        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                for id in 0..capacity as u32 {
                    producer.push(event(id));
                }
                while let Some(record) = consumer.pop() {
                    black_box(record);
                }
            })
        });
    }

    group.finish();
}

fn bench_cross_thread(c: &mut Criterion) {
    const ITEMS: u32 = 100_000;

    let mut group = c.benchmark_group("ring_cross_thread");
    group.throughput(Throughput::Elements(ITEMS as u64));
    group.sample_size(20);

    group.bench_function("stream_100k", |b| {
        b.iter(|| {
            let mut ring = RingBuffer::new(4096).expect("ring allocation");
            let (mut producer, mut consumer) = ring.split();

            std::thread::scope(|s| {
                s.spawn(move || {
                    for id in 0..ITEMS {
                        while !producer.push(event(id)) {
                            std::hint::spin_loop();
                        }
                    }
                });

                let mut received = 0;
                while received < ITEMS {
                    if let Some(record) = consumer.pop() {
                        black_box(record);
                        received += 1;
                    } else {
                        std::hint::spin_loop();
                    }
                }
            });
        })
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_fill_drain, bench_cross_thread);
criterion_main!(benches);
