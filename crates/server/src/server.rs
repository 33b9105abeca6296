use std::future::Future;
use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context as AnyhowContext, Result};
use bayou_protocol::{read_text_frame, write_frame, DEFAULT_MAX_FRAME_BYTES};
use bayou_search::{Predictor, SynthesisResponse};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::engine::SynthesisEngine;
use crate::settings::DEFAULT_IO_TIMEOUT;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Bound on reading the request and on writing the response.
    pub io_timeout: Duration,
    pub max_frame_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            io_timeout: DEFAULT_IO_TIMEOUT,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// Accept and answer connections one at a time until `shutdown` flips to true.
pub async fn serve<P>(
    listener: TcpListener,
    engine: SynthesisEngine<P>,
    options: ServerOptions,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    P: Predictor + Send + 'static,
{
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    log::info!("server shutting down");
                    return Ok(());
                }
            }
            accepted = listener.accept() => {
                let (mut stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        log::warn!("accept failed: {err}");
                        continue;
                    }
                };
                log::info!("connection accepted from {peer}");
                handle_connection(&mut stream, &engine, &options).await;
            }
        }
    }
}

/// Flip the returned receiver to true once `signal` completes.
///
/// If the signal cannot be installed the sender is held forever, so the
/// server keeps running rather than reading a closed channel as shutdown.
pub fn shutdown_on<F>(signal: F) -> watch::Receiver<bool>
where
    F: Future<Output = io::Result<()>> + Send + 'static,
{
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                let _ = tx.send(true);
            }
            Err(err) => {
                log::warn!("shutdown signal unavailable, serving until killed: {err}");
                std::future::pending::<()>().await;
                drop(tx);
            }
        }
    });
    rx
}

/// Answer a single request. Never fails: errors turn into the empty response,
/// and a connection that cannot take even that is dropped.
pub async fn handle_connection<S, P>(
    stream: &mut S,
    engine: &SynthesisEngine<P>,
    options: &ServerOptions,
) where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Predictor + Send + 'static,
{
    let started = Instant::now();
    let body = match respond(stream, engine, options).await {
        Ok(body) => body,
        Err(err) => {
            log::error!("request failed: {err:#}");
            fallback_body()
        }
    };

    match timeout(options.io_timeout, write_frame(stream, body.as_bytes())).await {
        Ok(Ok(())) => log::info!(
            "sent {} byte response in {:.2?}",
            body.len(),
            started.elapsed()
        ),
        Ok(Err(err)) => log::debug!("abandoning connection, send failed: {err}"),
        Err(_) => log::debug!("abandoning connection, send timed out"),
    }
    let _ = stream.shutdown().await;
}

async fn respond<S, P>(
    stream: &mut S,
    engine: &SynthesisEngine<P>,
    options: &ServerOptions,
) -> Result<String>
where
    S: AsyncRead + Unpin,
    P: Predictor + Send + 'static,
{
    let raw = timeout(
        options.io_timeout,
        read_text_frame(stream, options.max_frame_bytes),
    )
    .await
    .context("timed out reading request")?
    .context("malformed request frame")?;
    log::debug!("request: {raw}");

    engine.generate_json(raw).await
}

fn fallback_body() -> String {
    SynthesisResponse::empty()
        .to_json_pretty()
        .unwrap_or_else(|_| r#"{"evidences": [], "asts": []}"#.to_string())
}
