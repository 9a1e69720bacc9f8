//! 설정 관리 — eventgate.toml 파싱 및 런타임 설정
//!
//! [`EventgateConfig`]는 데몬이 소비하는 모든 설정을 담는 최상위
//! 구조체입니다. 인제스트 코어는 이 값을 해석하지 않고 그대로 전달받아
//! 사용합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`EVENTGATE_QUEUE_CAPACITY=8192` 형식)
//! 3. 설정 파일 (`eventgate.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), eventgate_core::error::EventgateError> {
//! use eventgate_core::config::EventgateConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = EventgateConfig::load("eventgate.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = EventgateConfig::parse("[queue]\ncapacity = 4096")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, EventgateError};

/// Eventgate 통합 설정
///
/// `eventgate.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventgateConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 서버 / 엔드포인트 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 이벤트 큐 설정
    #[serde(default)]
    pub queue: QueueConfig,
}

/// 일반 설정 (로깅, PID 파일)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 출력 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 비활성화)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 서버 / 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 이벤트 수신용 데이터그램 소켓 경로
    pub event_socket: String,
    /// API 요청/응답용 스트림 소켓 경로
    pub api_socket: String,
    /// API 요청 핸들러 타임아웃 (밀리초)
    pub api_timeout_ms: u64,
    /// 동시에 처리할 API 요청 수 제한 (0 = 무제한)
    pub api_queue_tasks: usize,
    /// 이벤트 소비자 워커 스레드 수
    pub consumer_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_socket: "/run/eventgate/queue".to_owned(),
            api_socket: "/run/eventgate/api".to_owned(),
            api_timeout_ms: 5000,
            api_queue_tasks: 50,
            consumer_threads: 4,
        }
    }
}

/// 이벤트 큐 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// 큐 최대 용량 (이벤트 수)
    pub capacity: usize,
    /// 플러드 파일 경로 (빈 문자열이면 오버플로우 시 드롭)
    pub flood_file: String,
    /// 플러드 파일 기록 시도 횟수
    pub flood_attempts: u32,
    /// 기록 시도 간 대기 시간 (밀리초)
    pub flood_sleep_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            flood_file: String::new(),
            flood_attempts: 3,
            flood_sleep_ms: 100,
        }
    }
}

impl EventgateConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, EventgateError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, EventgateError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EventgateError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                EventgateError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, EventgateError> {
        toml::from_str(toml_str).map_err(|e| {
            EventgateError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `EVENTGATE_{SECTION}_{FIELD}`
    /// 예: `EVENTGATE_SERVER_EVENT_SOCKET=/tmp/queue`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "EVENTGATE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "EVENTGATE_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "EVENTGATE_GENERAL_PID_FILE");

        // Server
        override_string(&mut self.server.event_socket, "EVENTGATE_SERVER_EVENT_SOCKET");
        override_string(&mut self.server.api_socket, "EVENTGATE_SERVER_API_SOCKET");
        override_u64(&mut self.server.api_timeout_ms, "EVENTGATE_SERVER_API_TIMEOUT_MS");
        override_usize(
            &mut self.server.api_queue_tasks,
            "EVENTGATE_SERVER_API_QUEUE_TASKS",
        );
        override_usize(
            &mut self.server.consumer_threads,
            "EVENTGATE_SERVER_CONSUMER_THREADS",
        );

        // Queue
        override_usize(&mut self.queue.capacity, "EVENTGATE_QUEUE_CAPACITY");
        override_string(&mut self.queue.flood_file, "EVENTGATE_QUEUE_FLOOD_FILE");
        override_u32(&mut self.queue.flood_attempts, "EVENTGATE_QUEUE_FLOOD_ATTEMPTS");
        override_u64(&mut self.queue.flood_sleep_ms, "EVENTGATE_QUEUE_FLOOD_SLEEP_MS");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 부분적으로만 유효한 설정으로 서버가 시작되지 않도록,
    /// 잘못된 값은 여기서 즉시 실패합니다.
    pub fn validate(&self) -> Result<(), EventgateError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.server.event_socket.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.event_socket".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.server.api_socket.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.api_socket".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.server.event_socket == self.server.api_socket {
            return Err(ConfigError::InvalidValue {
                field: "server.api_socket".to_owned(),
                reason: "event_socket and api_socket must differ".to_owned(),
            }
            .into());
        }

        if self.server.api_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.api_timeout_ms".to_owned(),
                reason: "must be greater than zero".to_owned(),
            }
            .into());
        }

        if self.server.consumer_threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.consumer_threads".to_owned(),
                reason: "must be greater than zero".to_owned(),
            }
            .into());
        }

        if self.queue.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue.capacity".to_owned(),
                reason: "must be greater than zero".to_owned(),
            }
            .into());
        }

        if !self.queue.flood_file.is_empty() && self.queue.flood_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue.flood_attempts".to_owned(),
                reason: "must be greater than zero when flood_file is set".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *target = value;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(env = env_key, value = %value, "ignoring non-numeric env override"),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(env = env_key, value = %value, "ignoring non-numeric env override"),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(env = env_key, value = %value, "ignoring non-numeric env override"),
        }
    }
}
