//! 이벤트 큐 벤치마크
//!
//! 단일/다중 프로듀서의 push-pop 처리량과 플러드 경로 비용을
//! 측정합니다.

use std::time::Duration;

use bytes::Bytes;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use eventgate_core::event::Event;
use eventgate_server::queue::BoundedEventQueue;

/// 전형적인 수집 이벤트 크기의 페이로드
const PAYLOAD: &[u8] =
    b"1:[agent-007] Jan 15 12:00:00 web-01 sshd[1234]: Failed password for root from 203.0.113.45";

fn make_event() -> Event {
    Event::new(Bytes::from_static(PAYLOAD), "event")
}

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_pop");
    group.throughput(Throughput::Elements(1));

    group.bench_function("try_push_then_pop", |b| {
        let queue = BoundedEventQueue::new(1024);
        b.iter(|| {
            queue.try_push(black_box(make_event())).unwrap();
            queue.pop(Duration::from_millis(1)).unwrap()
        })
    });

    group.throughput(Throughput::Elements(1000));
    group.bench_function("batch_1000", |b| {
        let queue = BoundedEventQueue::new(2048);
        b.iter(|| {
            for _ in 0..1000 {
                queue.try_push(make_event()).unwrap();
            }
            for _ in 0..1000 {
                queue.pop(Duration::from_millis(1)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_contended");
    group.throughput(Throughput::Elements(4000));

    group.bench_function("4_producers_2_consumers", |b| {
        b.iter(|| {
            let queue = BoundedEventQueue::new(256);
            let producers: Vec<_> = (0..4)
                .map(|_| {
                    let queue = queue.clone();
                    std::thread::spawn(move || {
                        for _ in 0..1000 {
                            queue.push(make_event()).unwrap();
                        }
                    })
                })
                .collect();
            let consumers: Vec<_> = (0..2)
                .map(|_| {
                    let queue = queue.clone();
                    std::thread::spawn(move || {
                        let mut count = 0usize;
                        while queue.pop(Duration::from_millis(50)).is_some() {
                            count += 1;
                        }
                        count
                    })
                })
                .collect();
            for p in producers {
                p.join().unwrap();
            }
            queue.close();
            let total: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
            black_box(total)
        })
    });

    group.finish();
}

fn bench_flood_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_flood");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push_or_flood_spill", |b| {
        let dir = tempfile::tempdir().unwrap();
        let queue = BoundedEventQueue::with_flood_file(
            1,
            dir.path().join("flood.log"),
            1,
            Duration::from_millis(1),
        )
        .unwrap();
        queue.try_push(make_event()).unwrap();
        b.iter(|| queue.push_or_flood(black_box(make_event())).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_contended, bench_flood_path);
criterion_main!(benches);
