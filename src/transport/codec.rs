//! Length-prefixed JSON framing for the point-to-point transport.
//!
//! Each frame is `<decimal byte length>#<json payload>`, e.g. `13#{"pattern":1}`.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const DELIMITER: u8 = b'#';

/// Longest accepted length header, in digits.
const MAX_HEADER_DIGITS: u64 = 20;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted length value of the supplied data: {0:?}")]
    CorruptedLength(String),

    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("Connection closed inside a frame")]
    Truncated,

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads frames from a buffered stream.
pub struct FrameReader<R> {
    inner: R,
    max_frame_bytes: usize,
    header: Vec<u8>,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(inner: R, max_frame_bytes: usize) -> Self {
        Self {
            inner,
            max_frame_bytes,
            header: Vec::with_capacity(MAX_HEADER_DIGITS as usize + 1),
        }
    }

    /// Next raw payload. `Ok(None)` on a clean end of stream.
    pub async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        self.header.clear();
        let read = (&mut self.inner)
            .take(MAX_HEADER_DIGITS + 1)
            .read_until(DELIMITER, &mut self.header)
            .await?;

        if read == 0 {
            return Ok(None);
        }
        if self.header.last() != Some(&DELIMITER) {
            if read as u64 > MAX_HEADER_DIGITS {
                return Err(CodecError::CorruptedLength(
                    String::from_utf8_lossy(&self.header).into_owned(),
                ));
            }
            return Err(CodecError::Truncated);
        }
        self.header.pop();

        let digits = std::str::from_utf8(&self.header)
            .ok()
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
        let len: usize = digits
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CodecError::CorruptedLength(String::from_utf8_lossy(&self.header).into_owned()))?;

        if len > self.max_frame_bytes {
            return Err(CodecError::TooLarge {
                len,
                max: self.max_frame_bytes,
            });
        }

        let mut payload = vec![0u8; len];
        self.inner.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                CodecError::Truncated
            } else {
                CodecError::Io(e)
            }
        })?;
        Ok(Some(payload))
    }

    /// Next payload decoded as JSON.
    pub async fn next_json<T: DeserializeOwned>(&mut self) -> Result<Option<T>, CodecError> {
        match self.next_frame().await? {
            Some(payload) => Ok(Some(serde_json::from_slice(&payload)?)),
            None => Ok(None),
        }
    }
}

/// Encode `value` as one frame.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_vec(value)?;
    let mut frame = Vec::with_capacity(json.len() + 8);
    frame.extend_from_slice(json.len().to_string().as_bytes());
    frame.push(DELIMITER);
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Write `value` as one frame and flush.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode(value)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
