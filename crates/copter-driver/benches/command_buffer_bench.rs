//! 指令缓冲区性能基准
//!
//! 调用者线程写入、控制线程快照，两边都不应互相阻塞。

use copter_driver::CommandBuffer;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

fn bench_set_and_snapshot(c: &mut Criterion) {
    let buffer = CommandBuffer::new(4);

    c.bench_function("command_set", |b| {
        b.iter(|| buffer.set(black_box(&[0.1, 0.2, 0.3, 0.4])).unwrap());
    });

    c.bench_function("command_snapshot", |b| {
        b.iter(|| black_box(buffer.snapshot()));
    });
}

/// 后台线程持续写入时的快照开销
fn bench_snapshot_under_contention(c: &mut Criterion) {
    let buffer = Arc::new(CommandBuffer::new(4));
    let running = Arc::new(AtomicBool::new(true));

    let writer = {
        let buffer = buffer.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut k = 0.0;
            while running.load(Ordering::Relaxed) {
                let _ = buffer.set(&[k; 4]);
                k += 1.0;
            }
        })
    };

    c.bench_function("command_snapshot_contended", |b| {
        b.iter(|| black_box(buffer.snapshot()));
    });

    running.store(false, Ordering::Relaxed);
    let _ = writer.join();
}

criterion_group!(benches, bench_set_and_snapshot, bench_snapshot_under_contention);
criterion_main!(benches);
