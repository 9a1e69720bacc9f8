//! Eventgate 인제스트 코어
//!
//! 보안 이벤트 처리 엔진의 수신 계층입니다. 세 부분으로 구성됩니다:
//!
//! - [`queue`] — 디스크 오버플로우(플러드 파일)를 갖춘 바운디드
//!   이벤트 큐
//! - [`endpoint`] — 로컬 소켓 엔드포인트 (데이터그램 인제스트 +
//!   스트림 API)
//! - [`server`] — 엔드포인트 레지스트리와 생명주기를 소유하는
//!   [`EngineServer`]
//!
//! [`consumer`]는 큐 반대편의 워커 스레드 풀로, 꺼낸 이벤트를 싱크
//! 콜백에 넘깁니다.

pub mod consumer;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod server;

// --- 주요 타입 re-export ---

pub use consumer::{ConsumerPool, EventSink};
pub use endpoint::{DatagramEndpoint, Endpoint, EndpointKind, RequestHandler, StreamEndpoint};
pub use error::{EndpointError, FrameError, IngestError, QueueError};
pub use queue::{BoundedEventQueue, QueueStats};
pub use server::{EngineServer, ServerHandle, ServerState};
