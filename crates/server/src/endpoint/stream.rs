//! 스트림 API 엔드포인트
//!
//! 연결 지향 요청/응답 채널입니다. 연결마다 태스크 하나가 프레임을
//! 읽고 핸들러를 호출한 뒤 응답 프레임을 돌려줍니다. 한 연결 안에서
//! 요청과 응답은 엄격히 교대합니다.
//!
//! 서버를 보호하는 두 가지 상한이 있습니다: 동시 처리 중인 요청 수
//! (`max_inflight`, 0이면 무제한)와 요청당 처리 시간(`timeout`).
//! 어느 쪽이든 초과하면 연결을 끊는 대신 busy 응답을 돌려줍니다.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use eventgate_core::metrics as m;

use crate::endpoint::bind;
use crate::error::{EndpointError, FrameError};
use crate::protocol;

/// 요청 핸들러 — 요청 페이로드를 받아 응답 페이로드 또는 에러
/// 메시지를 돌려줍니다.
pub type RequestHandler = Arc<
    dyn Fn(Bytes) -> Pin<Box<dyn Future<Output = Result<Bytes, String>> + Send>> + Send + Sync,
>;

const ACCEPT_BACKLOG: i32 = 1024;

/// 서버가 포화 상태일 때의 정형 응답
pub fn busy_response() -> Bytes {
    Bytes::from_static(br#"{"error":429,"message":"server is busy, try again later"}"#)
}

/// 핸들러 실패 시의 정형 응답
pub fn error_response(message: &str) -> Bytes {
    let body = serde_json::json!({ "error": 500, "message": message });
    Bytes::from(body.to_string())
}

/// 스트림 엔드포인트 — API 요청/응답 경로
pub struct StreamEndpoint {
    name: String,
    path: PathBuf,
    handler: RequestHandler,
    timeout: Duration,
    max_inflight: usize,
    listener: Option<UnixListener>,
}

impl StreamEndpoint {
    /// 새 스트림 엔드포인트를 생성합니다. 소켓은 아직 바인드되지
    /// 않습니다. `max_inflight`가 0이면 동시 요청 수 제한이 없습니다.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        handler: RequestHandler,
        timeout: Duration,
        max_inflight: usize,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            handler,
            timeout,
            max_inflight,
            listener: None,
        }
    }

    /// 엔드포인트 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 소켓 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 리스너를 바인드합니다.
    pub fn configure(&mut self) -> Result<(), EndpointError> {
        let listener = bind::bind_stream(&self.path, ACCEPT_BACKLOG)?;
        tracing::info!(endpoint = %self.name, path = %self.path.display(), "stream endpoint bound");
        self.listener = Some(listener);
        Ok(())
    }

    /// accept 루프 — 취소될 때까지 연결을 받아 태스크로 넘깁니다.
    ///
    /// 취소되면 새 연결을 멈추고 진행 중인 연결 태스크가 모두 끝날
    /// 때까지 기다린 뒤 소켓 파일을 제거합니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), EndpointError> {
        let listener = self.listener.take().ok_or_else(|| EndpointError::Socket {
            path: self.path.display().to_string(),
            reason: "endpoint not configured".to_owned(),
        })?;

        let limiter = (self.max_inflight > 0)
            .then(|| Arc::new(Semaphore::new(self.max_inflight)));
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let conn = Connection {
                            endpoint: self.name.clone(),
                            conn_id: uuid::Uuid::new_v4().to_string(),
                            handler: Arc::clone(&self.handler),
                            timeout: self.timeout,
                            limiter: limiter.clone(),
                        };
                        tracker.spawn(conn.serve(stream, cancel.child_token()));
                    }
                    Err(e) => {
                        metrics::counter!(
                            m::ENDPOINT_RECV_ERRORS_TOTAL,
                            m::LABEL_ENDPOINT => self.name.clone()
                        )
                        .increment(1);
                        tracing::warn!(endpoint = %self.name, error = %e, "accept failed");
                    }
                },
            }
        }

        tracker.close();
        tracker.wait().await;

        if let Err(e) = bind::remove_stale(&self.path) {
            tracing::warn!(endpoint = %self.name, error = %e, "cannot remove socket file");
        }
        tracing::info!(endpoint = %self.name, "stream endpoint stopped");
        Ok(())
    }
}

/// 연결 하나의 처리 상태
struct Connection {
    endpoint: String,
    conn_id: String,
    handler: RequestHandler,
    timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
}

impl Connection {
    async fn serve(self, stream: UnixStream, cancel: CancellationToken) {
        metrics::gauge!(m::API_OPEN_CONNECTIONS).increment(1.0);
        tracing::debug!(endpoint = %self.endpoint, conn = %self.conn_id, "connection opened");

        let (mut reader, mut writer) = stream.into_split();
        loop {
            let frame = tokio::select! {
                () = cancel.cancelled() => break,
                frame = protocol::read_frame(&mut reader) => frame,
            };

            let request = match frame {
                Ok(Some(payload)) => payload,
                Ok(None) => break,
                Err(e @ (FrameError::Empty | FrameError::TooLarge { .. })) => {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        conn = %self.conn_id,
                        error = %e,
                        "protocol violation, closing connection"
                    );
                    break;
                }
                Err(FrameError::Io(e)) => {
                    tracing::debug!(
                        endpoint = %self.endpoint,
                        conn = %self.conn_id,
                        error = %e,
                        "connection read failed"
                    );
                    break;
                }
            };

            let response = self.dispatch(request).await;
            if let Err(e) = protocol::write_frame(&mut writer, &response).await {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    conn = %self.conn_id,
                    error = %e,
                    "connection write failed"
                );
                break;
            }
        }

        metrics::gauge!(m::API_OPEN_CONNECTIONS).decrement(1.0);
        tracing::debug!(endpoint = %self.endpoint, conn = %self.conn_id, "connection closed");
    }

    /// 요청 하나를 처리해 응답 페이로드를 만듭니다. 항상 응답을
    /// 돌려주므로 요청/응답 교대가 깨지지 않습니다.
    async fn dispatch(&self, request: Bytes) -> Bytes {
        metrics::counter!(
            m::API_REQUESTS_TOTAL,
            m::LABEL_ENDPOINT => self.endpoint.clone()
        )
        .increment(1);

        let _permit = match &self.limiter {
            Some(semaphore) => match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    metrics::counter!(m::API_BUSY_TOTAL).increment(1);
                    tracing::debug!(
                        endpoint = %self.endpoint,
                        conn = %self.conn_id,
                        "request limit reached, answering busy"
                    );
                    return busy_response();
                }
            },
            None => None,
        };

        match tokio::time::timeout(self.timeout, (self.handler)(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(message)) => {
                metrics::counter!(m::API_ERRORS_TOTAL).increment(1);
                tracing::warn!(
                    endpoint = %self.endpoint,
                    conn = %self.conn_id,
                    error = %message,
                    "handler failed"
                );
                error_response(&message)
            }
            Err(_) => {
                metrics::counter!(m::API_BUSY_TOTAL).increment(1);
                tracing::warn!(
                    endpoint = %self.endpoint,
                    conn = %self.conn_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "handler timed out, answering busy"
                );
                busy_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn echo_handler() -> RequestHandler {
        Arc::new(|payload| Box::pin(async move { Ok(payload) }))
    }

    fn slow_handler(delay: Duration) -> RequestHandler {
        Arc::new(move |payload| {
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(payload)
            })
        })
    }

    async fn start(
        handler: RequestHandler,
        timeout: Duration,
        max_inflight: usize,
    ) -> (PathBuf, CancellationToken, tokio::task::JoinHandle<()>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.sock");
        let mut endpoint = StreamEndpoint::new("api", &path, handler, timeout, max_inflight);
        endpoint.configure().unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                endpoint.run(cancel).await.unwrap();
            }
        });
        (path, cancel, task, dir)
    }

    async fn request(stream: &mut UnixStream, payload: &[u8]) -> Bytes {
        let mut frame = (payload.len() as u32).to_le_bytes().to_vec();
        frame.extend_from_slice(payload);
        stream.write_all(&frame).await.unwrap();

        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await.unwrap();
        let len = u32::from_le_bytes(header) as usize;
        let mut response = vec![0u8; len];
        stream.read_exact(&mut response).await.unwrap();
        Bytes::from(response)
    }

    #[tokio::test]
    async fn echoes_requests_in_order() {
        let (path, cancel, task, _dir) =
            start(echo_handler(), Duration::from_secs(1), 0).await;

        let mut stream = UnixStream::connect(&path).await.unwrap();
        for n in 0..5 {
            let payload = format!("request-{n}");
            let response = request(&mut stream, payload.as_bytes()).await;
            assert_eq!(response, Bytes::from(payload));
        }

        cancel.cancel();
        task.await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn concurrent_connections_are_isolated() {
        let (path, cancel, task, _dir) =
            start(echo_handler(), Duration::from_secs(1), 0).await;

        let mut clients = Vec::new();
        for c in 0..4 {
            let path = path.clone();
            clients.push(tokio::spawn(async move {
                let mut stream = UnixStream::connect(&path).await.unwrap();
                for n in 0..10 {
                    let payload = format!("client-{c}-req-{n}");
                    let response = request(&mut stream, payload.as_bytes()).await;
                    assert_eq!(response, Bytes::from(payload));
                }
            }));
        }
        for client in clients {
            client.await.unwrap();
        }

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn slow_handler_gets_busy_response_and_connection_survives() {
        let (path, cancel, task, _dir) = start(
            slow_handler(Duration::from_secs(5)),
            Duration::from_millis(50),
            0,
        )
        .await;

        let mut stream = UnixStream::connect(&path).await.unwrap();
        let response = request(&mut stream, b"slow").await;
        assert_eq!(response, busy_response());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn handler_error_becomes_error_response() {
        let handler: RequestHandler =
            Arc::new(|_| Box::pin(async { Err("unknown command".to_owned()) }));
        let (path, cancel, task, _dir) = start(handler, Duration::from_secs(1), 0).await;

        let mut stream = UnixStream::connect(&path).await.unwrap();
        let response = request(&mut stream, b"bogus").await;
        let body: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(body["error"], 500);
        assert_eq!(body["message"], "unknown command");

        // 연결은 살아있어야 합니다.
        let again = request(&mut stream, b"bogus").await;
        assert!(!again.is_empty());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn oversized_frame_closes_connection() {
        let (path, cancel, task, _dir) =
            start(echo_handler(), Duration::from_secs(1), 0).await;

        let mut stream = UnixStream::connect(&path).await.unwrap();
        let bad_len = (eventgate_core::event::MAX_MSG_SIZE as u32) + 1;
        stream.write_all(&bad_len.to_le_bytes()).await.unwrap();

        let mut buf = [0u8; 1];
        let read = stream.read(&mut buf).await.unwrap();
        assert_eq!(read, 0, "server should close the connection");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn inflight_limit_returns_busy() {
        let (path, cancel, task, _dir) = start(
            slow_handler(Duration::from_millis(300)),
            Duration::from_secs(2),
            1,
        )
        .await;

        let first = tokio::spawn({
            let path = path.clone();
            async move {
                let mut stream = UnixStream::connect(&path).await.unwrap();
                request(&mut stream, b"first").await
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut stream = UnixStream::connect(&path).await.unwrap();
        let second = request(&mut stream, b"second").await;
        assert_eq!(second, busy_response());

        assert_eq!(first.await.unwrap(), Bytes::from_static(b"first"));

        cancel.cancel();
        task.await.unwrap();
    }
}
