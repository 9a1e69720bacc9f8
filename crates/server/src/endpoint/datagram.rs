//! 데이터그램 이벤트 엔드포인트
//!
//! 수집 소스가 보내는 단방향 이벤트 데이터그램을 받아 큐에 넣습니다.
//! 응답은 없습니다. 수신 루프는 어떤 경우에도 블로킹 push를 하지
//! 않으며, 큐가 가득 차면 플러드 정책에 따릅니다.

use std::path::{Path, PathBuf};

use tokio::net::UnixDatagram;
use tokio_util::sync::CancellationToken;

use eventgate_core::event::{Event, MAX_MSG_SIZE};
use eventgate_core::metrics as m;

use crate::endpoint::bind;
use crate::error::{EndpointError, QueueError};
use crate::queue::BoundedEventQueue;

/// 데이터그램 엔드포인트 — 이벤트 인제스트 경로
pub struct DatagramEndpoint {
    name: String,
    path: PathBuf,
    queue: BoundedEventQueue,
    socket: Option<UnixDatagram>,
}

impl DatagramEndpoint {
    /// 새 데이터그램 엔드포인트를 생성합니다. 소켓은 아직 바인드되지
    /// 않습니다.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, queue: BoundedEventQueue) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            queue,
            socket: None,
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

    /// 소켓을 바인드합니다. 실패하면 파일시스템에 부분 상태를 남기지
    /// 않습니다.
    pub fn configure(&mut self) -> Result<(), EndpointError> {
        let socket = bind::bind_datagram(&self.path)?;
        tracing::info!(endpoint = %self.name, path = %self.path.display(), "datagram endpoint bound");
        self.socket = Some(socket);
        Ok(())
    }

    /// 수신 루프 — 취소될 때까지 데이터그램을 큐로 옮깁니다.
    ///
    /// `configure()`가 먼저 성공해야 합니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), EndpointError> {
        let socket = self.socket.take().ok_or_else(|| EndpointError::Socket {
            path: self.path.display().to_string(),
            reason: "endpoint not configured".to_owned(),
        })?;

        let mut buf = vec![0u8; MAX_MSG_SIZE];
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                received = socket.recv(&mut buf) => match received {
                    Ok(len) => self.ingest(&buf[..len]),
                    Err(e) => {
                        metrics::counter!(
                            m::ENDPOINT_RECV_ERRORS_TOTAL,
                            m::LABEL_ENDPOINT => self.name.clone()
                        )
                        .increment(1);
                        tracing::warn!(endpoint = %self.name, error = %e, "datagram recv failed");
                    }
                },
            }
        }

        self.cleanup();
        Ok(())
    }

    fn ingest(&self, data: &[u8]) {
        if data.is_empty() {
            tracing::debug!(endpoint = %self.name, "ignoring empty datagram");
            return;
        }
        if data.len() == MAX_MSG_SIZE {
            // 커널이 잘라낸 데이터그램일 수 있습니다.
            tracing::warn!(
                endpoint = %self.name,
                len = data.len(),
                "datagram at maximum size, payload may be truncated"
            );
        }

        metrics::counter!(
            m::ENDPOINT_RECEIVED_TOTAL,
            m::LABEL_ENDPOINT => self.name.clone()
        )
        .increment(1);

        let event = Event::new(bytes::Bytes::copy_from_slice(data), self.name.clone());
        match self.queue.push_or_flood(event) {
            Ok(()) => {}
            Err(QueueError::Full) => {
                tracing::warn!(endpoint = %self.name, "queue full without flood file, event dropped");
            }
            Err(e @ QueueError::FloodWriteFailed { .. }) => {
                tracing::error!(endpoint = %self.name, error = %e, "event lost, flood write failed");
            }
            Err(QueueError::Closed) => {
                tracing::debug!(endpoint = %self.name, "queue closed, event dropped");
            }
        }
    }

    fn cleanup(&self) {
        if let Err(e) = bind::remove_stale(&self.path) {
            tracing::warn!(endpoint = %self.name, error = %e, "cannot remove socket file");
        }
        tracing::info!(endpoint = %self.name, "datagram endpoint stopped");
    }
}
