//! 이벤트 타입 — 인제스트 계층이 다루는 기본 단위
//!
//! [`Event`]는 수집된 보안 텔레메트리 한 건을 나타냅니다.
//! 인제스트 코어는 페이로드를 해석하지 않으며, 큐에 넣고 꺼내는
//! 동안 불변 바이트 덩어리로만 취급합니다. 페이로드는 `bytes::Bytes`로
//! 보관되어 복사 없이 스레드 간 이동이 가능합니다.

use std::fmt;
use std::time::SystemTime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 데이터그램 / API 프레임의 최대 페이로드 크기 (바이트)
///
/// 로컬 소켓의 수신 버퍼도 최소 이 크기까지 확장됩니다.
pub const MAX_MSG_SIZE: usize = 65536 + 512;

/// 이벤트 메타데이터 — 도착 시각과 수집 소스
///
/// 흐름 추적과 플러드 파일 기록에 사용됩니다. 코어의 동작에는
/// 영향을 주지 않는 관측 전용 정보입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 도착 시각
    pub received_at: SystemTime,
    /// 수집 소스 식별자 (예: 엔드포인트 이름 "event")
    pub source: String,
}

impl EventMetadata {
    /// 현재 시각으로 새 메타데이터를 생성합니다.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            received_at: SystemTime::now(),
            source: source.into(),
        }
    }
}

/// 수집된 보안 이벤트 한 건
///
/// 페이로드는 코어 입장에서 불투명한 바이트이며, 큐에 push된 순간부터
/// 소비자가 pop할 때까지 큐가 소유합니다. pop 이후 소유권은 소비자에게
/// 넘어갑니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// 원시 페이로드
    pub payload: Bytes,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
}

impl Event {
    /// 새 이벤트를 생성합니다. 도착 시각은 현재 시각입니다.
    pub fn new(payload: Bytes, source: impl Into<String>) -> Self {
        Self {
            payload,
            metadata: EventMetadata::new(source),
        }
    }

    /// 도착 시각을 지정하여 이벤트를 생성합니다.
    ///
    /// 플러드 파일에서 기록을 복원할 때처럼 원래 시각을 보존해야
    /// 하는 경우에 사용합니다.
    pub fn with_timestamp(
        payload: Bytes,
        source: impl Into<String>,
        received_at: SystemTime,
    ) -> Self {
        Self {
            payload,
            metadata: EventMetadata {
                received_at,
                source: source.into(),
            },
        }
    }

    /// 페이로드 크기를 반환합니다 (바이트).
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// 페이로드가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event[source={} size={}]",
            self.metadata.source,
            self.payload.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_creation() {
        let event = Event::new(Bytes::from_static(b"1:[agent] login failed"), "event");
        assert_eq!(event.metadata.source, "event");
        assert_eq!(event.len(), 22);
        assert!(!event.is_empty());
        assert!(event.metadata.received_at <= SystemTime::now());
    }

    #[test]
    fn event_with_timestamp_preserves_time() {
        let ts = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let event = Event::with_timestamp(Bytes::from_static(b"x"), "flood", ts);
        assert_eq!(event.metadata.received_at, ts);
        assert_eq!(event.metadata.source, "flood");
    }

    #[test]
    fn event_display() {
        let event = Event::new(Bytes::from_static(b"abc"), "event");
        let display = event.to_string();
        assert!(display.contains("source=event"));
        assert!(display.contains("size=3"));
    }

    #[test]
    fn event_serde_round_trip() {
        let event = Event::new(Bytes::from_static(b"\x00\x01raw bytes\xff"), "event");
        let json = serde_json::to_string(&event).unwrap();
        let restored: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn event_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Event>();
    }

    #[test]
    fn empty_event() {
        let event = Event::new(Bytes::new(), "event");
        assert!(event.is_empty());
        assert_eq!(event.len(), 0);
    }
}
