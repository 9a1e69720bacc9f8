//! 인제스트 코어 에러 타입
//!
//! [`IngestError`]는 큐, 엔드포인트, 서버 생명주기에서 발생하는 모든
//! 에러를 표현합니다. `From<IngestError> for EventgateError` 변환이
//! 구현되어 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수
//! 있습니다.

use eventgate_core::error::{EventgateError, ServerError};

/// 이벤트 큐 에러
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// 큐가 가득 참 (논블로킹 push 또는 플러드 미설정 시)
    #[error("queue full")]
    Full,

    /// 플러드 파일 기록까지 실패 — 유일한 데이터 손실 경로
    #[error("flood write failed after {attempts} attempts to '{path}': {reason}")]
    FloodWriteFailed {
        /// 플러드 파일 경로
        path: String,
        /// 시도한 기록 횟수
        attempts: u32,
        /// 마지막 실패 사유
        reason: String,
    },

    /// 큐가 닫힌 뒤의 push
    #[error("queue closed")]
    Closed,
}

/// 엔드포인트 설정/바인드 에러
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// 소켓 경로가 플랫폼 제한을 초과
    #[error("socket path '{path}' too long, maximum length is {max}")]
    PathTooLong {
        /// 요청된 소켓 경로
        path: String,
        /// 플랫폼이 허용하는 최대 경로 길이 (바이트)
        max: usize,
    },

    /// 소켓 생성/바인드/권한/버퍼 설정 실패
    #[error("cannot bind socket '{path}': {source}")]
    Bind {
        /// 소켓 경로
        path: String,
        /// OS 에러
        #[source]
        source: std::io::Error,
    },

    /// configure() 이전에 run을 시도한 경우 등 소켓 상태 오류
    #[error("socket '{path}': {reason}")]
    Socket {
        /// 소켓 경로
        path: String,
        /// 사유
        reason: String,
    },
}

/// 프레이밍(길이 접두 프로토콜) 에러
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// 길이가 0인 프레임
    #[error("zero-length frame")]
    Empty,

    /// 허용 크기를 초과한 프레임
    #[error("frame of {len} bytes exceeds maximum {max}")]
    TooLarge {
        /// 선언된 프레임 길이
        len: usize,
        /// 허용 최대 길이
        max: usize,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 인제스트 코어 최상위 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 큐 에러
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// 엔드포인트 에러
    #[error("endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    /// 중복된 엔드포인트 이름
    #[error("endpoint '{name}' already registered")]
    DuplicateEndpoint {
        /// 중복된 이름
        name: String,
    },

    /// start() 이후의 등록/재시작 시도
    #[error("server already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 서버에 대한 조작
    #[error("server not running")]
    NotRunning,

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for EventgateError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::AlreadyRunning => EventgateError::Server(ServerError::AlreadyRunning),
            IngestError::NotRunning => EventgateError::Server(ServerError::NotRunning),
            other => EventgateError::Server(ServerError::InitFailed(other.to_string())),
        }
    }
}
