//! Benchmarks for file-tally
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_queue_operations(c: &mut Criterion) {
    use file_tally::engine::{WorkItem, WorkQueue};

    c.bench_function("queue_enqueue_claim", |b| {
        let queue = WorkQueue::new();
        let claimer = queue.claimer();

        b.iter(|| {
            queue.enqueue(WorkItem::new(0, "/data/file.txt"));
            let item = claimer.try_claim().unwrap();
            black_box(item);
        })
    });
}

fn benchmark_accumulator_add(c: &mut Criterion) {
    use file_tally::engine::SharedAccumulator;

    c.bench_function("accumulator_add", |b| {
        let acc = SharedAccumulator::new();

        b.iter(|| {
            acc.add(black_box(17));
        })
    });
}

fn benchmark_gate_signal(c: &mut Criterion) {
    use file_tally::engine::CompletionGate;

    c.bench_function("gate_signal_one", |b| {
        b.iter_batched(
            || CompletionGate::new(1),
            |gate| {
                gate.signal_one().unwrap();
                black_box(gate);
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    benchmark_queue_operations,
    benchmark_accumulator_add,
    benchmark_gate_signal
);
criterion_main!(benches);
