/*
[INPUT]:  Established WebSocket stream
[OUTPUT]: Queue-backed write handle (shared) and read half (single owner)
[POS]:    WebSocket layer - session ownership
[UPDATE]: When changing how loops share the connection
*/

use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use std::fmt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{BboError, Result};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read half of the session. Owned by exactly one reader loop.
pub type SessionReader = SplitStream<WsStream>;

const OUTBOUND_QUEUE_SIZE: usize = 64;

type WriteAck = oneshot::Sender<std::result::Result<(), tungstenite::Error>>;

struct Outbound {
    message: WsMessage,
    ack: Option<WriteAck>,
}

/// Cloneable write handle.
///
/// Frames are queued to a single writer task that owns the sink, so no caller
/// ever waits on another caller's write. `send*` waits for the write result;
/// `try_send_text` only enqueues.
#[derive(Clone)]
pub struct SessionWriter {
    outbound: mpsc::Sender<Outbound>,
}

impl fmt::Debug for SessionWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionWriter")
            .field("closed", &self.outbound.is_closed())
            .finish()
    }
}

impl SessionWriter {
    /// Spawn the writer task over `sink` on the current runtime.
    pub fn spawn<S>(sink: S) -> Self
    where
        S: Sink<WsMessage, Error = tungstenite::Error> + Unpin + Send + 'static,
    {
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        tokio::spawn(run_writer(sink, outbound_rx));
        Self { outbound }
    }

    pub async fn send(&self, message: WsMessage) -> Result<()> {
        let (ack, result) = oneshot::channel();
        self.outbound
            .send(Outbound {
                message,
                ack: Some(ack),
            })
            .await
            .map_err(|_| BboError::WriterClosed)?;
        result
            .await
            .map_err(|_| BboError::WriterClosed)?
            .map_err(BboError::Send)
    }

    pub async fn send_text(&self, text: String) -> Result<()> {
        self.send(WsMessage::Text(text.into())).await
    }

    pub async fn send_json<T: Serialize>(&self, payload: &T) -> Result<()> {
        let text = serde_json::to_string(payload)?;
        self.send_text(text).await
    }

    pub async fn send_ping(&self) -> Result<()> {
        self.send(WsMessage::Ping(Vec::<u8>::new().into())).await
    }

    /// Enqueue a text frame without waiting for the queue or the write.
    pub fn try_send_text(&self, text: String) -> Result<()> {
        self.outbound
            .try_send(Outbound {
                message: WsMessage::Text(text.into()),
                ack: None,
            })
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => BboError::WriterBusy,
                mpsc::error::TrySendError::Closed(_) => BboError::WriterClosed,
            })
    }

    pub fn try_send_json<T: Serialize>(&self, payload: &T) -> Result<()> {
        let text = serde_json::to_string(payload)?;
        self.try_send_text(text)
    }

    /// Send a Close frame and stop the writer. Errors from an already-closed peer are ignored.
    pub async fn close(&self) {
        let _ = self.send(WsMessage::Close(None)).await;
    }
}

async fn run_writer<S>(mut sink: S, mut outbound_rx: mpsc::Receiver<Outbound>)
where
    S: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    while let Some(Outbound { message, ack }) = outbound_rx.recv().await {
        let closing = matches!(message, WsMessage::Close(_));
        let result = sink.send(message).await;
        let failed = result.is_err();
        if let Some(ack) = ack {
            let _ = ack.send(result);
        }
        if closing {
            let _ = sink.close().await;
            break;
        }
        if failed {
            break;
        }
    }
    debug!("session writer stopped");
}

/// A live session: one shared writer, one read half handed out once.
pub struct Session {
    writer: SessionWriter,
    reader: Option<SessionReader>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("writer", &self.writer)
            .field("reader_available", &self.reader.is_some())
            .finish()
    }
}

impl Session {
    pub fn new(stream: WsStream) -> Self {
        let (sink, reader) = stream.split();
        Self {
            writer: SessionWriter::spawn(sink),
            reader: Some(reader),
        }
    }

    pub fn writer(&self) -> SessionWriter {
        self.writer.clone()
    }

    pub fn take_reader(&mut self) -> Result<SessionReader> {
        self.reader.take().ok_or(BboError::ReaderTaken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink;
    use std::pin::Pin;
    use std::time::Duration;
    use tokio::time::timeout;

    type TestSink = Pin<Box<dyn Sink<WsMessage, Error = tungstenite::Error> + Send>>;

    fn stalled_sink() -> TestSink {
        Box::pin(sink::unfold((), |_, _message: WsMessage| async {
            std::future::pending::<std::result::Result<(), tungstenite::Error>>().await
        }))
    }

    fn failing_sink() -> TestSink {
        Box::pin(sink::unfold((), |_, _message: WsMessage| async {
            Err::<(), _>(tungstenite::Error::AlreadyClosed)
        }))
    }

    #[tokio::test]
    async fn test_try_send_does_not_wait_for_stalled_write() {
        let writer = SessionWriter::spawn(stalled_sink());

        let pinger = writer.clone();
        let ping = tokio::spawn(async move { pinger.send_ping().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!ping.is_finished());

        let queued = timeout(Duration::from_millis(100), async {
            writer.try_send_text(r#"{"op":"pong"}"#.to_string())
        })
        .await;
        assert!(matches!(queued, Ok(Ok(()))));
        ping.abort();
    }

    #[tokio::test]
    async fn test_try_send_reports_full_queue() {
        let writer = SessionWriter::spawn(stalled_sink());
        let mut results = Vec::new();
        for _ in 0..=OUTBOUND_QUEUE_SIZE + 1 {
            results.push(writer.try_send_text("x".to_string()));
        }
        assert!(matches!(results.last(), Some(Err(BboError::WriterBusy))));
    }

    #[tokio::test]
    async fn test_write_failure_stops_writer() {
        let writer = SessionWriter::spawn(failing_sink());

        assert!(matches!(writer.send_ping().await, Err(BboError::Send(_))));
        assert!(matches!(writer.send_ping().await, Err(BboError::WriterClosed)));
        assert!(matches!(
            writer.try_send_text("x".to_string()),
            Err(BboError::WriterClosed)
        ));
    }
}
