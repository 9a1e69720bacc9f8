//! 에러 타입 — 도메인별 에러 정의

/// Eventgate 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum EventgateError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 서버 / 인제스트 계층 에러
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 서버 생명주기 에러
///
/// 인제스트 계층(`eventgate-server`)의 상세 에러는 해당 크레이트가
/// 자체 타입으로 정의하며, 상위 레이어로는 이 타입으로 변환되어
/// 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// 서버 초기화 실패
    #[error("server init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("server already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("server not running")]
    NotRunning,
}
