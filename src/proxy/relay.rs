use crate::audit::{headers_to_map, LogRecord, LogWriter, PendingLog, ResponseLog};
use axum::body::{Body, Bytes};
use bytes::BytesMut;
use futures_util::{Stream, StreamExt};
use serde_json::{Map, Value};
use std::{error::Error as StdError, io};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, warn};

/// Largest chunk handed to the caller in one piece.
pub const CHUNK_SIZE: usize = 8192;

const RELAY_CHANNEL_CAPACITY: usize = 100;

type Chunk = Result<Bytes, io::Error>;

/// Relays a streaming upstream response to the caller while accumulating it for the log.
///
/// Upstream is drained on a separate task so the log is completed even when the
/// caller goes away mid-stream.
pub fn relay_stream(response: reqwest::Response, pending: PendingLog, writer: LogWriter) -> Body {
    let capture = StreamCapture::new(
        pending,
        response.status().as_u16(),
        headers_to_map(response.headers()),
        writer,
    );
    let (tx, rx) = mpsc::channel::<Chunk>(RELAY_CHANNEL_CAPACITY);

    tokio::spawn(drain_upstream(response.bytes_stream(), tx, capture));

    Body::from_stream(ReceiverStream::new(rx))
}

async fn drain_upstream<S, E>(upstream: S, tx: mpsc::Sender<Chunk>, mut capture: StreamCapture)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<Box<dyn StdError + Send + Sync>> + std::fmt::Display,
{
    futures_util::pin_mut!(upstream);
    let mut client_connected = true;

    while let Some(frame) = upstream.next().await {
        match frame {
            Ok(frame) => {
                for chunk in split_chunks(frame) {
                    capture.push(&chunk);
                    if client_connected && tx.send(Ok(chunk)).await.is_err() {
                        warn!("Client disconnected mid-stream, draining upstream to complete the log");
                        client_connected = false;
                    }
                }
            }
            Err(e) => {
                error!("Stream error: {}", e);
                if client_connected {
                    let _ = tx.send(Err(io::Error::new(io::ErrorKind::Other, e))).await;
                }
                break;
            }
        }
    }

    drop(tx);
    debug!(bytes = capture.len(), "Upstream stream finished");
    capture.finish().await;
}

/// Splits an upstream frame into pieces of at most [`CHUNK_SIZE`] bytes without copying.
fn split_chunks(mut frame: Bytes) -> impl Iterator<Item = Bytes> {
    std::iter::from_fn(move || {
        if frame.is_empty() {
            return None;
        }
        let n = frame.len().min(CHUNK_SIZE);
        Some(frame.split_to(n))
    })
}

/// Accumulates a streamed body and writes its log record exactly once.
///
/// If the capture is dropped without [`StreamCapture::finish`] (the relay task was
/// cancelled), the record is written synchronously from `Drop`.
struct StreamCapture {
    pending: Option<PendingLog>,
    status_code: u16,
    headers: Map<String, Value>,
    buffer: BytesMut,
    writer: LogWriter,
}

impl StreamCapture {
    fn new(
        pending: PendingLog,
        status_code: u16,
        headers: Map<String, Value>,
        writer: LogWriter,
    ) -> Self {
        Self {
            pending: Some(pending),
            status_code,
            headers,
            buffer: BytesMut::new(),
            writer,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn take_record(&mut self) -> Option<LogRecord> {
        let pending = self.pending.take()?;
        let body = String::from_utf8_lossy(&self.buffer).into_owned();
        Some(pending.finish(ResponseLog::Completed {
            status_code: self.status_code,
            headers: std::mem::take(&mut self.headers),
            body: Value::String(body),
        }))
    }

    async fn finish(mut self) {
        if let Some(record) = self.take_record() {
            self.writer.write(&record).await;
        }
    }
}

impl Drop for StreamCapture {
    fn drop(&mut self) {
        if let Some(record) = self.take_record() {
            warn!("Stream relay ended early, writing log synchronously");
            self.writer.write_blocking(&record);
        }
    }
}
