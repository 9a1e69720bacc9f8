//! 로컬 소켓 엔드포인트
//!
//! 엔드포인트는 두 종류뿐이며 닫힌 집합이므로 트레이트 오브젝트 대신
//! enum으로 디스패치합니다. 둘 다 같은 생명주기를 따릅니다:
//! `configure()`로 바인드한 뒤 `run()`으로 루프를 돌리고, 취소 토큰으로
//! 멈춥니다.

pub mod bind;
pub mod datagram;
pub mod stream;

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::EndpointError;

pub use datagram::DatagramEndpoint;
pub use stream::{RequestHandler, StreamEndpoint, busy_response, error_response};

/// 엔드포인트 종류 태그 — 조회/로깅 편의용
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// 단방향 이벤트 인제스트
    Event,
    /// 요청/응답 API
    Api,
}

/// 등록 가능한 엔드포인트
pub enum Endpoint {
    /// 단방향 이벤트 인제스트 (데이터그램)
    Datagram(DatagramEndpoint),
    /// 요청/응답 API (스트림)
    Stream(StreamEndpoint),
}

impl Endpoint {
    /// 엔드포인트 종류
    pub fn kind(&self) -> EndpointKind {
        match self {
            Endpoint::Datagram(_) => EndpointKind::Event,
            Endpoint::Stream(_) => EndpointKind::Api,
        }
    }

    /// 엔드포인트 이름
    pub fn name(&self) -> &str {
        match self {
            Endpoint::Datagram(ep) => ep.name(),
            Endpoint::Stream(ep) => ep.name(),
        }
    }

    /// 소켓 경로
    pub fn path(&self) -> &Path {
        match self {
            Endpoint::Datagram(ep) => ep.path(),
            Endpoint::Stream(ep) => ep.path(),
        }
    }

    /// 소켓을 바인드합니다.
    pub fn configure(&mut self) -> Result<(), EndpointError> {
        match self {
            Endpoint::Datagram(ep) => ep.configure(),
            Endpoint::Stream(ep) => ep.configure(),
        }
    }

    /// 엔드포인트 루프를 실행합니다. 취소될 때까지 반환하지 않습니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), EndpointError> {
        match self {
            Endpoint::Datagram(ep) => ep.run(cancel).await,
            Endpoint::Stream(ep) => ep.run(cancel).await,
        }
    }
}
