//! Wire framing per RFC 5734 §4.
//!
//! Each frame on the wire is a 4-byte unsigned big-endian length header
//! followed by exactly `length - 4` bytes of payload; the length includes
//! the header itself. The framer does not interpret the payload as XML —
//! that is the [`crate::xml`] module's job — and it does no buffering
//! beyond whatever the underlying stream provides.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Size of the length header, in bytes.
pub const HEADER_LEN: usize = 4;

/// A length header must describe at least this many bytes: itself plus at
/// least one byte of payload.
pub const MIN_FRAME_LEN: u32 = 5;

/// Default idle-timeout bound on a single frame read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Framing-layer failures. Every variant here means no response is sent;
/// the connection loop terminates the session directly — framing errors
/// never become an EPP response frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The 4-byte length header declared fewer than [`MIN_FRAME_LEN`] bytes.
    #[error("frame length {0} is smaller than the minimum of {MIN_FRAME_LEN}")]
    LengthTooShort(u32),
    /// The stream ended before a complete frame could be read.
    #[error("connection closed while reading a frame")]
    Eof,
    /// The frame read did not complete within the idle timeout.
    #[error("frame read timed out")]
    Timeout,
    /// A transport-level I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn classify_io_error(e: std::io::Error) -> FrameError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof { FrameError::Eof } else { FrameError::Io(e) }
}

/// Read one length-prefixed frame's payload from `reader`.
///
/// # Errors
/// Returns [`FrameError::Eof`] if the stream ends before a complete frame
/// arrives, [`FrameError::Timeout`] if `read_timeout` elapses first,
/// [`FrameError::LengthTooShort`] if the declared length is below
/// [`MIN_FRAME_LEN`], or [`FrameError::Io`] for any other transport error.
pub async fn read_frame<R>(reader: &mut R, read_timeout: Duration) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; HEADER_LEN];
    timeout(read_timeout, reader.read_exact(&mut len_buf))
        .await
        .map_err(|_| FrameError::Timeout)?
        .map_err(classify_io_error)?;

    let total_len = u32::from_be_bytes(len_buf);
    if total_len < MIN_FRAME_LEN {
        return Err(FrameError::LengthTooShort(total_len));
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "total_len - 4 always fits usize on supported platforms"
    )]
    let payload_len = (total_len - MIN_FRAME_LEN + 1) as usize;
    let mut payload = vec![0u8; payload_len];
    timeout(read_timeout, reader.read_exact(&mut payload))
        .await
        .map_err(|_| FrameError::Timeout)?
        .map_err(classify_io_error)?;

    Ok(payload)
}

/// Write one length-prefixed frame containing `payload` to `writer`, then
/// flush so the whole frame reaches the peer without being held in an
/// internal buffer.
///
/// # Errors
/// Returns [`FrameError::Io`] on any transport error, or
/// [`FrameError::LengthTooShort`] if `payload` is so large that
/// `payload.len() + 4` cannot be represented in a `u32`.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let total_len = u32::try_from(payload.len() + HEADER_LEN)
        .map_err(|_| FrameError::LengthTooShort(u32::MAX))?;
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&total_len.to_be_bytes());
    frame.extend_from_slice(payload);
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
