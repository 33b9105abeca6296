use std::time::Duration;

use anyhow::{Context as AnyhowContext, Result};
use bayou_protocol::{read_text_frame, write_frame, DEFAULT_MAX_FRAME_BYTES};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Send one evidence request to a running server and return the raw response.
pub async fn query(addr: &str, evidence_json: &str, io_timeout: Duration) -> Result<String> {
    serde_json::from_str::<serde_json::Value>(evidence_json)
        .context("evidence is not valid JSON")?;

    let mut stream = timeout(io_timeout, TcpStream::connect(addr))
        .await
        .with_context(|| format!("timed out connecting to {addr}"))?
        .with_context(|| format!("connect to AST server at {addr}"))?;

    write_frame(&mut stream, evidence_json.as_bytes())
        .await
        .context("failed to send evidence")?;

    // The server may sample for a while before answering; only the connect
    // is bounded by the I/O timeout.
    let response = read_text_frame(&mut stream, DEFAULT_MAX_FRAME_BYTES)
        .await
        .context("failed to read response")?;
    Ok(response)
}
