//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `eventgate_`
//! - 모듈명: `queue_`, `endpoint_`, `api_`, `daemon_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 엔드포인트 이름 레이블 키
pub const LABEL_ENDPOINT: &str = "endpoint";

// ─── Queue 메트릭 ──────────────────────────────────────────────────

/// Queue: 큐에 들어간 전체 이벤트 수 (counter)
pub const QUEUE_PUSHED_TOTAL: &str = "eventgate_queue_pushed_total";

/// Queue: 소비자가 꺼낸 전체 이벤트 수 (counter)
pub const QUEUE_POPPED_TOTAL: &str = "eventgate_queue_popped_total";

/// Queue: 플러드 파일로 흘려보낸 이벤트 수 (counter)
pub const QUEUE_FLOODED_TOTAL: &str = "eventgate_queue_flooded_total";

/// Queue: 드롭된 이벤트 수 — 플러드 기록까지 실패한 경우 (counter)
pub const QUEUE_DROPPED_TOTAL: &str = "eventgate_queue_dropped_total";

/// Queue: 현재 큐 점유량 (gauge)
pub const QUEUE_SIZE: &str = "eventgate_queue_size";

// ─── Endpoint 메트릭 ────────────────────────────────────────────────

/// Endpoint: 수신한 데이터그램 수 (counter, label: endpoint)
pub const ENDPOINT_RECEIVED_TOTAL: &str = "eventgate_endpoint_received_total";

/// Endpoint: 수신 중 소켓 에러 수 (counter, label: endpoint)
pub const ENDPOINT_RECV_ERRORS_TOTAL: &str = "eventgate_endpoint_recv_errors_total";

// ─── API 메트릭 ─────────────────────────────────────────────────────

/// API: 처리한 요청 수 (counter)
pub const API_REQUESTS_TOTAL: &str = "eventgate_api_requests_total";

/// API: busy 응답으로 거절된 요청 수 (counter)
pub const API_BUSY_TOTAL: &str = "eventgate_api_busy_total";

/// API: 핸들러 에러로 canned 에러 응답을 보낸 수 (counter)
pub const API_ERRORS_TOTAL: &str = "eventgate_api_errors_total";

/// API: 현재 열린 연결 수 (gauge)
pub const API_OPEN_CONNECTIONS: &str = "eventgate_api_open_connections";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "eventgate_daemon_uptime_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 하며, 일반적으로
/// `eventgate-daemon`의 시작 시점에서 호출합니다. 레코더가 없어도
/// 호출은 안전합니다 (no-op).
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        QUEUE_PUSHED_TOTAL,
        "Total number of events enqueued into the bounded event queue"
    );
    describe_counter!(
        QUEUE_POPPED_TOTAL,
        "Total number of events popped by consumers"
    );
    describe_counter!(
        QUEUE_FLOODED_TOTAL,
        "Total number of events spilled to the flood file"
    );
    describe_counter!(
        QUEUE_DROPPED_TOTAL,
        "Total number of events dropped after flood write failure"
    );
    describe_gauge!(QUEUE_SIZE, "Current number of events in the queue");

    describe_counter!(
        ENDPOINT_RECEIVED_TOTAL,
        "Datagrams received per event endpoint"
    );
    describe_counter!(
        ENDPOINT_RECV_ERRORS_TOTAL,
        "Transient socket errors per event endpoint"
    );

    describe_counter!(API_REQUESTS_TOTAL, "API requests processed");
    describe_counter!(API_BUSY_TOTAL, "API requests answered with the busy response");
    describe_counter!(
        API_ERRORS_TOTAL,
        "API requests answered with the canned error response"
    );
    describe_gauge!(API_OPEN_CONNECTIONS, "Currently open API connections");

    describe_gauge!(DAEMON_UPTIME_SECONDS, "Eventgate daemon uptime in seconds");
}
