//! 로컬 소켓 바인드 헬퍼
//!
//! 데이터그램/스트림 엔드포인트가 공유하는 Unix 도메인 소켓 준비
//! 절차입니다. 순서는 고정입니다: 경로 길이 검증 → 스테일 소켓 파일
//! 제거 → 소켓 생성(CLOEXEC) → 바인드 → 권한 0660 → 수신 버퍼 확장 →
//! 논블로킹 전환.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use socket2::{Domain, SockAddr, Socket, Type};

use eventgate_core::event::MAX_MSG_SIZE;

use crate::error::EndpointError;

/// 플랫폼이 허용하는 최대 소켓 경로 길이 (널 종료 제외, 바이트)
pub fn max_socket_path_len() -> usize {
    let addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_path.len() - 1
}

/// 소켓 파일의 요청 권한 — 소유 그룹의 로컬 프로세스만 접근
const SOCKET_MODE: u32 = 0o660;

fn check_path(path: &Path) -> Result<SockAddr, EndpointError> {
    let max = max_socket_path_len();
    let bytes = path.as_os_str().as_encoded_bytes();
    if bytes.len() > max {
        return Err(EndpointError::PathTooLong {
            path: path.display().to_string(),
            max,
        });
    }
    SockAddr::unix(path).map_err(|e| bind_err(path, e))
}

fn bind_err(path: &Path, source: std::io::Error) -> EndpointError {
    EndpointError::Bind {
        path: path.display().to_string(),
        source,
    }
}

/// 이전 실행이 남긴 소켓 파일을 제거합니다. 없으면 무시합니다.
pub fn remove_stale(path: &Path) -> Result<(), EndpointError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(bind_err(path, e)),
    }
}

fn prepare(path: &Path, ty: Type) -> Result<Socket, EndpointError> {
    let addr = check_path(path)?;
    remove_stale(path)?;

    // socket2는 지원 플랫폼에서 SOCK_CLOEXEC로 소켓을 생성합니다.
    let socket = Socket::new(Domain::UNIX, ty, None).map_err(|e| bind_err(path, e))?;
    socket.bind(&addr).map_err(|e| bind_err(path, e))?;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(SOCKET_MODE))
        .map_err(|e| bind_err(path, e))?;

    // 수신 버퍼가 최대 메시지보다 작으면 데이터그램이 잘리므로 확장을
    // 시도합니다. OS 상한에 걸려 실패해도 치명적이지 않습니다.
    if let Ok(current) = socket.recv_buffer_size()
        && current < MAX_MSG_SIZE
        && let Err(e) = socket.set_recv_buffer_size(MAX_MSG_SIZE)
    {
        tracing::warn!(
            path = %path.display(),
            current,
            error = %e,
            "cannot raise socket receive buffer"
        );
    }

    socket.set_nonblocking(true).map_err(|e| bind_err(path, e))?;
    Ok(socket)
}

/// 데이터그램 소켓을 준비하고 tokio 소켓으로 변환합니다.
pub fn bind_datagram(path: &Path) -> Result<tokio::net::UnixDatagram, EndpointError> {
    let socket = prepare(path, Type::DGRAM)?;
    let std_socket: std::os::unix::net::UnixDatagram = socket.into();
    tokio::net::UnixDatagram::from_std(std_socket).map_err(|e| bind_err(path, e))
}

/// 스트림 리스너를 준비하고 tokio 리스너로 변환합니다.
pub fn bind_stream(path: &Path, backlog: i32) -> Result<tokio::net::UnixListener, EndpointError> {
    let socket = prepare(path, Type::STREAM)?;
    socket.listen(backlog).map_err(|e| bind_err(path, e))?;
    let std_listener: std::os::unix::net::UnixListener = socket.into();
    tokio::net::UnixListener::from_std(std_listener).map_err(|e| bind_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_length_limit_matches_platform() {
        let max = max_socket_path_len();
        // 리눅스에서 sun_path는 108바이트입니다.
        assert!(max >= 90 && max <= 120);
    }

    #[test]
    fn overlong_path_is_rejected_without_touching_fs() {
        let long = format!("/tmp/{}", "x".repeat(200));
        let err = check_path(Path::new(&long)).unwrap_err();
        assert!(matches!(err, EndpointError::PathTooLong { .. }));
    }

    #[tokio::test]
    async fn bind_datagram_creates_socket_file_with_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.sock");

        let _socket = bind_datagram(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, SOCKET_MODE);
    }

    #[tokio::test]
    async fn bind_replaces_stale_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.sock");

        drop(bind_datagram(&path).unwrap());
        // 파일이 남아있는 상태에서 재바인드
        assert!(path.exists());
        let _socket = bind_datagram(&path).unwrap();
    }

    #[tokio::test]
    async fn bind_stream_accepts_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.sock");

        let listener = bind_stream(&path, 16).unwrap();
        let client = tokio::net::UnixStream::connect(&path);
        let (server, _) = tokio::join!(listener.accept(), client);
        assert!(server.is_ok());
    }

    #[test]
    fn bind_into_missing_directory_fails() {
        let err = bind_datagram(Path::new("/nonexistent-dir/queue.sock")).unwrap_err();
        assert!(matches!(err, EndpointError::Bind { .. }));
    }
}
