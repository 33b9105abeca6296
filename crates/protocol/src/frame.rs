use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest body accepted when the caller has no tighter limit.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("negative frame length {0}")]
    NegativeLength(i32),

    #[error("frame of {len} bytes exceeds {max} bytes")]
    TooLarge { len: usize, max: usize },

    #[error("connection closed before {expected} frame bytes arrived")]
    Truncated { expected: usize },

    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn map_eof(err: io::Error, expected: usize) -> FrameError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FrameError::Truncated { expected }
    } else {
        FrameError::Io(err)
    }
}

/// Read one length-prefixed frame body.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<Vec<u8>, FrameError> {
    let len = reader.read_i32().await.map_err(|err| map_eof(err, 4))?;
    let len = usize::try_from(len).map_err(|_| FrameError::NegativeLength(len))?;
    if len > max_bytes {
        return Err(FrameError::TooLarge {
            len,
            max: max_bytes,
        });
    }
    log::debug!("reading frame of {len} bytes");

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|err| map_eof(err, len))?;
    Ok(body)
}

/// Read one frame and decode it as UTF-8.
pub async fn read_text_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<String, FrameError> {
    let body = read_frame(reader, max_bytes).await?;
    Ok(String::from_utf8(body)?)
}

/// Write one frame and flush it.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), FrameError> {
    let len = i32::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        len: payload.len(),
        max: i32::MAX as usize,
    })?;
    writer.write_i32(len).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_round_trips_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let payload = r#"{"apicalls": ["readLine"]}"#;

        write_frame(&mut client, payload.as_bytes()).await.expect("write");
        let received = read_text_frame(&mut server, 1024).await.expect("read");
        assert_eq!(received, payload);
    }

    #[tokio::test]
    async fn length_prefix_is_big_endian() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_frame(&mut client, b"abc").await.expect("write");
        let mut raw = [0u8; 7];
        server.read_exact(&mut raw).await.expect("read raw");
        assert_eq!(raw, [0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[tokio::test]
    async fn rejects_negative_length() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_i32(-5).await.expect("write");

        let err = read_frame(&mut server, 1024).await.expect_err("negative length");
        assert!(matches!(err, FrameError::NegativeLength(-5)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn rejects_oversized_frames() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_i32(2048).await.expect("write");

        let err = read_frame(&mut server, 1024).await.expect_err("size limit");
        assert!(err.to_string().contains("exceeds"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn reports_truncated_body() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_i32(10).await.expect("write");
        client.write_all(b"short").await.expect("write");
        drop(client);

        let err = read_frame(&mut server, 1024).await.expect_err("truncated");
        assert!(
            matches!(err, FrameError::Truncated { expected: 10 }),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_frame(&mut client, &[0xff, 0xfe]).await.expect("write");

        let err = read_text_frame(&mut server, 1024).await.expect_err("utf8");
        assert!(matches!(err, FrameError::Utf8(_)), "unexpected error: {err}");
    }
}
