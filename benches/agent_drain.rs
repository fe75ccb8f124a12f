//! Benchmarks for agent drain latency
//!
//! Measures end-to-end time from a burst of pushes plus one notify to the point
//! where the agent has forwarded every event, using the in-process counting sink
//! so transport cost is excluded.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sensorlink::test_utils::event;
use sensorlink::{AgentConfig, CountingSink, RingBuffer, TelemetryAgent};
use std::hint::black_box;

fn bench_burst_drain(c: &mut Criterion) {
    const BURST: u32 = 512;

    let mut group = c.benchmark_group("agent_burst_drain");
    group.throughput(Throughput::Elements(BURST as u64));
    group.sample_size(30);

    for cap in [1usize, 50, 512] {
        let config = AgentConfig { max_drain_per_wake: cap, ..AgentConfig::default() };
        let mut ring = RingBuffer::new(BURST as usize).expect("ring allocation");
        let mut sink = CountingSink::new();
        let (mut producer, consumer) = ring.split();

        std::thread::scope(|scope| {
            let agent = TelemetryAgent::start_with_config(scope, consumer, &mut sink, &config)
                .expect("agent starts");

            group.bench_with_input(BenchmarkId::from_parameter(cap), &cap, |b, _| {
                b.iter(|| {
                    let target = agent.sent_count() + BURST as u64;
                    for id in 0..BURST {
                        producer.push(event(id));
                    }
                    agent.notify();
                    while agent.sent_count() < target {
                        std::hint::spin_loop();
                    }
                    black_box(target)
                })
            });

            agent.stop();
        });
    }

    group.finish();
}

criterion_group!(benches, bench_burst_drain);
criterion_main!(benches);
