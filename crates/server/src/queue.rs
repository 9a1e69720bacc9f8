//! 바운디드 이벤트 큐 — 멀티 프로듀서/컨슈머 + 디스크 오버플로우
//!
//! [`BoundedEventQueue`]는 고정 용량의 동시성 큐입니다. 데이터그램
//! 엔드포인트(프로듀서)는 이벤트 루프를 막지 않도록 논블로킹
//! [`try_push`](BoundedEventQueue::try_push) 또는 플러드 파일로
//! 흘려보내는 [`push_or_flood`](BoundedEventQueue::push_or_flood)를
//! 사용하고, 라우터의 워커 스레드(컨슈머)는 블로킹
//! [`pop`](BoundedEventQueue::pop)을 사용합니다.
//!
//! # 오버플로우 정책 (플러딩)
//! 큐가 가득 찬 상태에서 플러드 파일이 설정되어 있으면 이벤트는
//! 드롭되는 대신 파일에 append됩니다. 플러드 기록까지 실패한 경우가
//! 유일한 데이터 손실 경로이며 [`QueueError::FloodWriteFailed`]로
//! 보고됩니다. 플러드 파일 재생(replay)은 이 코어의 범위 밖입니다.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use eventgate_core::event::Event;
use eventgate_core::metrics as m;

use crate::error::QueueError;

/// 큐 내부 상태 — 뮤텍스로 보호됩니다.
struct QueueState {
    items: VecDeque<Event>,
    closed: bool,
}

/// 플러드 파일 기록기
///
/// append 전용 파일 핸들을 뮤텍스로 감싸 여러 프로듀서의 동시 기록을
/// 직렬화합니다. 레코드는 JSON 한 줄로, 이벤트를 그대로 복원할 수
/// 있는 정보를 담습니다.
struct FloodWriter {
    path: PathBuf,
    file: Mutex<File>,
    attempts: u32,
    retry_delay: Duration,
}

impl FloodWriter {
    fn open(path: &Path, attempts: u32, retry_delay: Duration) -> Result<Self, QueueError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| QueueError::FloodWriteFailed {
                path: path.display().to_string(),
                attempts: 0,
                reason: e.to_string(),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            attempts,
            retry_delay,
        })
    }

    /// 이벤트를 플러드 파일에 기록합니다.
    ///
    /// 최대 `attempts`회 시도하며, 시도 사이에 `retry_delay`만큼
    /// 대기합니다. 모든 시도가 실패하면 마지막 에러를 담아
    /// [`QueueError::FloodWriteFailed`]를 반환합니다.
    fn append(&self, event: &Event) -> Result<(), QueueError> {
        let line = serde_json::to_vec(event).map_err(|e| QueueError::FloodWriteFailed {
            path: self.path.display().to_string(),
            attempts: 0,
            reason: format!("serialize: {e}"),
        })?;

        let mut last_error = String::new();
        for attempt in 1..=self.attempts {
            {
                let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
                match file.write_all(&line).and_then(|()| file.write_all(b"\n")) {
                    Ok(()) => return Ok(()),
                    Err(e) => last_error = e.to_string(),
                }
            }
            if attempt < self.attempts {
                std::thread::sleep(self.retry_delay);
            }
        }

        Err(QueueError::FloodWriteFailed {
            path: self.path.display().to_string(),
            attempts: self.attempts,
            reason: last_error,
        })
    }
}

struct Inner {
    capacity: usize,
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
    flood: Option<FloodWriter>,
    pushed: AtomicU64,
    popped: AtomicU64,
    flooded: AtomicU64,
    dropped: AtomicU64,
}

/// 큐 통계 스냅샷 — 관측 전용
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    /// 현재 점유량 (근사치)
    pub size: usize,
    /// 최대 용량
    pub capacity: usize,
    /// 큐에 들어간 이벤트 총수
    pub pushed: u64,
    /// 소비된 이벤트 총수
    pub popped: u64,
    /// 플러드 파일로 흘려보낸 이벤트 총수
    pub flooded: u64,
    /// 드롭된 이벤트 총수 (플러드 기록 실패)
    pub dropped: u64,
}

/// 고정 용량 멀티 프로듀서/컨슈머 이벤트 큐
///
/// 핸들은 저렴하게 clone할 수 있으며 모든 clone이 같은 큐를
/// 공유합니다. 내부는 뮤텍스 + 조건변수 2개(not_empty / not_full)로
/// 동기화되어 wakeup 유실이 없습니다.
///
/// 점유량은 어떤 순간에도 `capacity`를 넘지 않습니다. 같은 프로듀서
/// 스레드가 넣은 이벤트들 사이의 FIFO 순서는 보존되며, 각 이벤트는
/// 정확히 한 컨슈머에게 전달됩니다.
#[derive(Clone)]
pub struct BoundedEventQueue {
    inner: Arc<Inner>,
}

impl BoundedEventQueue {
    /// 플러드 파일 없이 큐를 생성합니다. 가득 차면 push가 거부됩니다.
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None)
    }

    /// 플러드 파일이 설정된 큐를 생성합니다.
    ///
    /// 파일은 즉시 append 모드로 열리며, 열 수 없으면 바로 실패합니다
    /// (서버가 부분 설정 상태로 시작하지 않도록).
    pub fn with_flood_file(
        capacity: usize,
        path: impl AsRef<Path>,
        attempts: u32,
        retry_delay: Duration,
    ) -> Result<Self, QueueError> {
        let flood = FloodWriter::open(path.as_ref(), attempts, retry_delay)?;
        Ok(Self::build(capacity, Some(flood)))
    }

    fn build(capacity: usize, flood: Option<FloodWriter>) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity,
                state: Mutex::new(QueueState {
                    items: VecDeque::with_capacity(capacity.min(10_000)),
                    closed: false,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                flood,
                pushed: AtomicU64::new(0),
                popped: AtomicU64::new(0),
                flooded: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// 논블로킹 push — 이벤트 루프 스레드에서 호출해도 안전합니다.
    ///
    /// 가득 찼으면 [`QueueError::Full`], 닫혔으면
    /// [`QueueError::Closed`]를 반환합니다.
    pub fn try_push(&self, event: Event) -> Result<(), QueueError> {
        let mut state = self.lock_state();
        if state.closed {
            return Err(QueueError::Closed);
        }
        if state.items.len() >= self.inner.capacity {
            return Err(QueueError::Full);
        }
        state.items.push_back(event);
        self.record_push(state.items.len());
        self.inner.not_empty.notify_one();
        Ok(())
    }

    /// 블로킹 push — 용량이 생길 때까지 호출 스레드를 재웁니다.
    ///
    /// 백프레셔가 필요한, 이벤트 루프 밖의 호출자 전용입니다.
    /// 엔드포인트 콜백 안에서는 절대 사용하지 않습니다.
    pub fn push(&self, event: Event) -> Result<(), QueueError> {
        let mut state = self.lock_state();
        loop {
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.items.len() < self.inner.capacity {
                break;
            }
            state = self
                .inner
                .not_full
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
        state.items.push_back(event);
        self.record_push(state.items.len());
        self.inner.not_empty.notify_one();
        Ok(())
    }

    /// 플러드 인지 push — 데이터그램 엔드포인트의 핫패스입니다.
    ///
    /// 큐에 자리가 있으면 즉시 넣습니다. 가득 찼고 플러드 파일이
    /// 설정되어 있으면 파일에 기록하고 성공을 반환합니다. 플러드
    /// 기록까지 실패하면 [`QueueError::FloodWriteFailed`] — 호출자는
    /// 반드시 에러 레벨로 로깅해야 하는 유일한 데이터 손실
    /// 경로입니다. 플러드 파일이 없으면 [`QueueError::Full`]입니다.
    pub fn push_or_flood(&self, event: Event) -> Result<(), QueueError> {
        {
            let mut state = self.lock_state();
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.items.len() < self.inner.capacity {
                state.items.push_back(event);
                self.record_push(state.items.len());
                self.inner.not_empty.notify_one();
                return Ok(());
            }
        }

        // 가득 참 — 락을 놓은 뒤 디스크로 흘려보냅니다. 플러드 기록은
        // 느릴 수 있으므로 절대 큐 락을 잡은 채 수행하지 않습니다.
        match &self.inner.flood {
            Some(flood) => match flood.append(&event) {
                Ok(()) => {
                    self.inner.flooded.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!(m::QUEUE_FLOODED_TOTAL).increment(1);
                    Ok(())
                }
                Err(e) => {
                    self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!(m::QUEUE_DROPPED_TOTAL).increment(1);
                    Err(e)
                }
            },
            None => {
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::QUEUE_DROPPED_TOTAL).increment(1);
                Err(QueueError::Full)
            }
        }
    }

    /// 블로킹 pop — 이벤트가 생기거나 `timeout`이 지날 때까지
    /// 대기합니다.
    ///
    /// 타임아웃이 지나거나, 큐가 닫힌 뒤 비어있으면 `None`을
    /// 반환합니다. 닫힌 큐에 남은 이벤트는 계속 꺼낼 수 있습니다
    /// (드레인).
    pub fn pop(&self, timeout: Duration) -> Option<Event> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock_state();
        loop {
            if let Some(event) = state.items.pop_front() {
                self.record_pop(state.items.len());
                self.inner.not_full.notify_one();
                return Some(event);
            }
            if state.closed {
                return None;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, result) = self
                .inner
                .not_empty
                .wait_timeout(state, remaining)
                .unwrap_or_else(|e| e.into_inner());
            state = guard;
            if result.timed_out() && state.items.is_empty() {
                return None;
            }
        }
    }

    /// 큐를 닫습니다 — 멱등.
    ///
    /// 대기 중인 모든 프로듀서/컨슈머를 깨웁니다. 이후의 push는
    /// [`QueueError::Closed`]로 실패하지만, 남은 이벤트는 pop으로
    /// 드레인할 수 있어 종료 시에도 이벤트가 조용히 사라지지
    /// 않습니다.
    pub fn close(&self) {
        let mut state = self.lock_state();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.inner.not_empty.notify_all();
        self.inner.not_full.notify_all();
    }

    /// 닫힘 여부를 반환합니다.
    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// 현재 점유량 (근사치, 관측 전용 — 제어 판단에 쓰지 말 것)
    pub fn size(&self) -> usize {
        self.lock_state().items.len()
    }

    /// 최대 용량
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// 큐가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.lock_state().items.is_empty()
    }

    /// 플러드 파일 설정 여부
    pub fn flood_enabled(&self) -> bool {
        self.inner.flood.is_some()
    }

    /// 통계 스냅샷을 반환합니다.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            size: self.size(),
            capacity: self.inner.capacity,
            pushed: self.inner.pushed.load(Ordering::Relaxed),
            popped: self.inner.popped.load(Ordering::Relaxed),
            flooded: self.inner.flooded.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_push(&self, len: usize) {
        self.inner.pushed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::QUEUE_PUSHED_TOTAL).increment(1);
        metrics::gauge!(m::QUEUE_SIZE).set(len as f64);
    }

    fn record_pop(&self, len: usize) {
        self.inner.popped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::QUEUE_POPPED_TOTAL).increment(1);
        metrics::gauge!(m::QUEUE_SIZE).set(len as f64);
    }
}
