//! Eventgate 공통 타입 크레이트
//!
//! 인제스트 계층(`eventgate-server`)과 바이너리 크레이트들이 공유하는
//! 이벤트 타입, 에러, 설정, 메트릭 상수를 정의합니다.

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, EventgateError, ServerError};

// 설정
pub use config::EventgateConfig;

// 이벤트
pub use event::{Event, EventMetadata, MAX_MSG_SIZE};
