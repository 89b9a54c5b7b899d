//! Length-prefixed framing for commands and responses.
//!
//! Each frame is a big-endian `u32` byte count followed by that many bytes of
//! UTF-8. A zero-length frame or a clean EOF ends the conversation.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;

#[derive(Debug)]
pub enum Frame {
    Message(String),
    /// Peer sent something we will not interpret. The payload has already
    /// been consumed, so the stream is still aligned on a frame boundary.
    Rejected(ProtocolError),
    Closed,
}

/// Reads one frame. Payloads above `max_len` are drained and rejected.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Frame, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(Frame::Closed),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(header) as usize;
    if len == 0 {
        return Ok(Frame::Closed);
    }

    if len > max_len {
        let mut remainder = (&mut *reader).take(len as u64);
        let drained = tokio::io::copy(&mut remainder, &mut tokio::io::sink()).await?;
        if drained < len as u64 {
            return Ok(Frame::Closed);
        }
        return Ok(Frame::Rejected(ProtocolError::Oversized { len, max: max_len }));
    }

    let mut payload = vec![0u8; len];
    match reader.read_exact(&mut payload).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(Frame::Closed),
        Err(e) => return Err(e.into()),
    }

    match String::from_utf8(payload) {
        Ok(text) => Ok(Frame::Message(text)),
        Err(_) => Ok(Frame::Rejected(ProtocolError::NotUtf8)),
    }
}

pub async fn write_frame<W>(writer: &mut W, payload: &str) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::Oversized {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload.as_bytes());

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn message_survives_embedded_newlines() {
        let (mut a, mut b) = duplex(256);
        write_frame(&mut a, "AAPL 150.0\nMSFT No Data").await.unwrap();

        match read_frame(&mut b, 1024).await.unwrap() {
            Frame::Message(text) => assert_eq!(text, "AAPL 150.0\nMSFT No Data"),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[tokio::test]
    async fn eof_and_empty_frame_close_the_stream() {
        let (a, mut b) = duplex(64);
        drop(a);
        assert!(matches!(read_frame(&mut b, 1024).await.unwrap(), Frame::Closed));

        let (mut a, mut b) = duplex(64);
        a.write_all(&0u32.to_be_bytes()).await.unwrap();
        assert!(matches!(read_frame(&mut b, 1024).await.unwrap(), Frame::Closed));
    }

    #[tokio::test]
    async fn oversized_frame_is_drained_and_stream_stays_aligned() {
        let (mut a, mut b) = duplex(8192);
        write_frame(&mut a, &"x".repeat(2000)).await.unwrap();
        write_frame(&mut a, "--reset").await.unwrap();

        assert!(matches!(
            read_frame(&mut b, 1024).await.unwrap(),
            Frame::Rejected(ProtocolError::Oversized { len: 2000, max: 1024 })
        ));
        match read_frame(&mut b, 1024).await.unwrap() {
            Frame::Message(text) => assert_eq!(text, "--reset"),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_utf8_is_rejected() {
        let (mut a, mut b) = duplex(64);
        a.write_all(&2u32.to_be_bytes()).await.unwrap();
        a.write_all(&[0xff, 0xfe]).await.unwrap();

        assert!(matches!(
            read_frame(&mut b, 1024).await.unwrap(),
            Frame::Rejected(ProtocolError::NotUtf8)
        ));
    }

    #[tokio::test]
    async fn truncated_payload_is_treated_as_disconnect() {
        let (mut a, mut b) = duplex(64);
        a.write_all(&10u32.to_be_bytes()).await.unwrap();
        a.write_all(b"--pr").await.unwrap();
        drop(a);

        assert!(matches!(read_frame(&mut b, 1024).await.unwrap(), Frame::Closed));
    }
}
