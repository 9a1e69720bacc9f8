//! 스트림 소켓용 길이 접두 프레이밍
//!
//! API 스트림 연결은 `u32` 리틀엔디언 길이 헤더 뒤에 페이로드가
//! 따라오는 프레임을 주고받습니다. 요청과 응답 모두 같은 프레이밍을
//! 사용합니다.
//!
//! 헤더가 [`MAX_MSG_SIZE`]를 초과하는 길이를 선언하거나 0을 선언하면
//! 프레임 동기화를 신뢰할 수 없으므로 호출자는 연결을 닫아야 합니다.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use eventgate_core::event::MAX_MSG_SIZE;

use crate::error::FrameError;

/// 프레임 헤더 크기 (바이트)
pub const HEADER_LEN: usize = 4;

/// 프레임 하나를 읽습니다.
///
/// 반환값:
/// - `Ok(Some(payload))` — 완전한 프레임
/// - `Ok(None)` — 프레임 경계에서의 정상 EOF (피어가 연결을 닫음)
/// - `Err(FrameError::Empty | TooLarge)` — 프로토콜 위반, 연결을 닫을 것
/// - `Err(FrameError::Io)` — 프레임 중간 EOF 포함 I/O 에러
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Bytes>, FrameError>
where
    R: AsyncRead + Unpin,
{
    // 헤더 첫 바이트 전의 EOF만 정상 종료로 취급합니다. read_exact는
    // 부분 읽기 후의 EOF도 UnexpectedEof로 뭉뚱그리므로 첫 바이트는
    // 따로 읽습니다.
    let mut header = [0u8; HEADER_LEN];
    match reader.read(&mut header[..1]).await {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(e) => return Err(FrameError::Io(e)),
    }
    reader.read_exact(&mut header[1..]).await?;

    let len = u32::from_le_bytes(header) as usize;
    if len == 0 {
        return Err(FrameError::Empty);
    }
    if len > MAX_MSG_SIZE {
        return Err(FrameError::TooLarge {
            len,
            max: MAX_MSG_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(Bytes::from(payload)))
}

/// 프레임 하나를 기록합니다. 헤더와 페이로드를 연속으로 씁니다.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    debug_assert!(payload.len() <= MAX_MSG_SIZE);
    let header = (payload.len() as u32).to_le_bytes();
    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
