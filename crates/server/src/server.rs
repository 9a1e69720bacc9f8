//! 엔진 서버 — 엔드포인트 레지스트리와 생명주기
//!
//! [`EngineServer`]는 엔드포인트들을 등록받아 한꺼번에 바인드하고,
//! 각각을 태스크로 띄운 뒤 정지 요청까지 실행합니다. 생명주기는
//! 단방향입니다: Configured → Running → StopRequested → Stopped.
//! 재시작은 지원하지 않습니다. 새 서버를 만드는 쪽이 단순하고
//! 상태 꼬임이 없습니다.
//!
//! 정지는 [`ServerHandle::request_stop`]으로 요청합니다. 핸들은 어느
//! 스레드에서든 안전하게 호출할 수 있고, 중복 요청은 합쳐집니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::endpoint::{Endpoint, bind};
use crate::error::IngestError;

/// 서버 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    /// 엔드포인트 등록을 받는 초기 상태
    Configured = 0,
    /// 모든 엔드포인트 루프가 실행 중
    Running = 1,
    /// 정지가 요청되어 종료가 진행 중
    StopRequested = 2,
    /// 모든 엔드포인트가 정리된 최종 상태
    Stopped = 3,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ServerState::Configured,
            1 => ServerState::Running,
            2 => ServerState::StopRequested,
            _ => ServerState::Stopped,
        }
    }
}

/// 실행 중인 서버를 밖에서 제어하는 핸들
///
/// clone이 저렴하며 시그널 핸들러 등 어느 컨텍스트에서든 쓸 수
/// 있습니다.
#[derive(Clone)]
pub struct ServerHandle {
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
}

impl ServerHandle {
    /// 서버 정지를 요청합니다. 멱등이며 즉시 반환합니다.
    pub fn request_stop(&self) {
        let previous = self.state.compare_exchange(
            ServerState::Running as u8,
            ServerState::StopRequested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if previous.is_ok() {
            tracing::info!("server stop requested");
        }
        self.cancel.cancel();
    }

    /// 현재 서버 상태
    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// 엔드포인트 레지스트리와 이벤트 루프를 소유하는 서버
pub struct EngineServer {
    endpoints: Vec<Endpoint>,
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
}

impl Default for EngineServer {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineServer {
    /// 빈 레지스트리의 서버를 생성합니다.
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            state: Arc::new(AtomicU8::new(ServerState::Configured as u8)),
            cancel: CancellationToken::new(),
        }
    }

    /// 제어 핸들을 반환합니다. `start()` 전에 받아둘 수 있습니다.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
        }
    }

    /// 엔드포인트를 등록합니다. 시작 이후에는 등록할 수 없으며,
    /// 이름과 소켓 경로는 레지스트리 안에서 유일해야 합니다.
    pub fn add_endpoint(&mut self, endpoint: Endpoint) -> Result<(), IngestError> {
        if self.state() != ServerState::Configured {
            return Err(IngestError::AlreadyRunning);
        }
        if self
            .endpoints
            .iter()
            .any(|e| e.name() == endpoint.name() || e.path() == endpoint.path())
        {
            return Err(IngestError::DuplicateEndpoint {
                name: endpoint.name().to_owned(),
            });
        }
        tracing::debug!(
            endpoint = endpoint.name(),
            kind = ?endpoint.kind(),
            path = %endpoint.path().display(),
            "endpoint registered"
        );
        self.endpoints.push(endpoint);
        Ok(())
    }

    /// 현재 서버 상태
    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 서버를 시작하고 정지가 완료될 때까지 실행합니다.
    ///
    /// 등록 순서대로 모든 엔드포인트를 바인드합니다. 하나라도
    /// 실패하면 이미 바인드된 소켓 파일을 정리하고 시작 전 상태로
    /// 되돌아가 에러를 반환합니다 — 부분적으로 뜬 서버는 없습니다.
    ///
    /// 정지 요청이 오면 모든 엔드포인트 루프가 내려가고 소켓 파일이
    /// 제거될 때까지 기다린 뒤 반환합니다.
    pub async fn start(&mut self) -> Result<(), IngestError> {
        if self.state() != ServerState::Configured {
            return Err(IngestError::AlreadyRunning);
        }

        // 바인드는 실패 시 전체 롤백
        for index in 0..self.endpoints.len() {
            if let Err(e) = self.endpoints[index].configure() {
                for configured in &self.endpoints[..index] {
                    let _ = bind::remove_stale(configured.path());
                }
                return Err(e.into());
            }
        }

        let tracker = TaskTracker::new();
        for mut endpoint in self.endpoints.drain(..) {
            let cancel = self.cancel.clone();
            let name = endpoint.name().to_owned();
            tracker.spawn(async move {
                if let Err(e) = endpoint.run(cancel).await {
                    tracing::error!(endpoint = %name, error = %e, "endpoint loop failed");
                }
            });
        }
        tracker.close();

        self.state
            .store(ServerState::Running as u8, Ordering::Release);
        tracing::info!("engine server running");

        self.cancel.cancelled().await;
        self.state
            .store(ServerState::StopRequested as u8, Ordering::Release);

        tracker.wait().await;
        self.state
            .store(ServerState::Stopped as u8, Ordering::Release);
        tracing::info!("engine server stopped");
        Ok(())
    }
}
