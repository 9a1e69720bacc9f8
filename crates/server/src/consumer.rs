//! 컨슈머 스레드 풀
//!
//! 큐에서 이벤트를 꺼내 싱크로 넘기는 전용 OS 스레드들입니다. 싱크가
//! 무거운 동기 작업을 해도 tokio 런타임을 막지 않도록 async 태스크가
//! 아닌 스레드를 사용합니다.
//!
//! 각 스레드는 짧은 타임아웃으로 pop을 반복하다가 큐가 닫히고
//! 비워지면 종료합니다. 큐를 닫기 전에 들어온 이벤트는 종료 과정에서
//! 모두 소비됩니다.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use eventgate_core::event::Event;

use crate::error::IngestError;
use crate::queue::BoundedEventQueue;

/// 이벤트 싱크 — 소비된 이벤트의 목적지
pub type EventSink = Arc<dyn Fn(Event) + Send + Sync>;

const POP_TIMEOUT: Duration = Duration::from_millis(250);

/// 큐를 소비하는 스레드 풀
pub struct ConsumerPool {
    workers: Vec<JoinHandle<()>>,
}

impl ConsumerPool {
    /// `threads`개의 컨슈머 스레드를 띄웁니다.
    pub fn spawn(
        queue: BoundedEventQueue,
        sink: EventSink,
        threads: usize,
    ) -> Result<Self, IngestError> {
        let mut workers = Vec::with_capacity(threads);
        for worker_id in 0..threads {
            let queue = queue.clone();
            let sink = Arc::clone(&sink);
            let worker = std::thread::Builder::new()
                .name(format!("eventgate-consumer-{worker_id}"))
                .spawn(move || worker_loop(worker_id, queue, sink))?;
            workers.push(worker);
        }
        Ok(Self { workers })
    }

    /// 모든 컨슈머 스레드가 끝날 때까지 기다립니다.
    ///
    /// 먼저 큐를 close()하지 않으면 반환하지 않습니다.
    pub fn join(self) {
        for worker in self.workers {
            if worker.join().is_err() {
                tracing::error!("consumer thread panicked");
            }
        }
    }
}

fn worker_loop(worker_id: usize, queue: BoundedEventQueue, sink: EventSink) {
    tracing::debug!(worker_id, "consumer started");
    loop {
        match queue.pop(POP_TIMEOUT) {
            Some(event) => sink(event),
            None => {
                if queue.is_closed() && queue.is_empty() {
                    break;
                }
            }
        }
    }
    tracing::debug!(worker_id, "consumer stopped");
}
