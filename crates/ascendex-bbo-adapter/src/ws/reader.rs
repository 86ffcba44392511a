/*
[INPUT]:  Session read half, writer for heartbeat replies, output channels
[OUTPUT]: Validated OrderBookUpdate values in arrival order + skipped-frame diagnostics
[POS]:    WebSocket layer - decode/validate/emit loop
[UPDATE]: When changing the frame schema, validation rules, or skip policy
*/

use futures_util::StreamExt;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::{Order, OrderBookUpdate};
use crate::ws::message::{SubscribeRequest, WireMessage};
use crate::ws::session::{SessionReader, SessionWriter};

const SKIP_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

/// A frame that produced no update, and why.
#[derive(Debug, Clone, PartialEq)]
pub enum SkippedFrame {
    /// Payload larger than the configured frame cap
    Oversized { bytes: usize, limit: usize },
    /// Payload is not JSON or does not match the wire schema
    Decode { error: String },
    /// `bid` or `ask` has fewer than two elements
    Shape { bid_len: usize, ask_len: usize },
    /// Amount or price is not a finite decimal
    InvalidNumber { field: &'static str, value: String },
    /// Ask not strictly above bid; expected, not an error
    CrossedMarket { ask_price: f64, bid_price: f64 },
}

impl SkippedFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            SkippedFrame::Oversized { .. } => "oversized",
            SkippedFrame::Decode { .. } => "decode",
            SkippedFrame::Shape { .. } => "shape",
            SkippedFrame::InvalidNumber { .. } => "invalid_number",
            SkippedFrame::CrossedMarket { .. } => "crossed_market",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, SkippedFrame::CrossedMarket { .. })
    }
}

impl fmt::Display for SkippedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkippedFrame::Oversized { bytes, limit } => {
                write!(f, "frame of {bytes} bytes exceeds {limit} byte limit")
            }
            SkippedFrame::Decode { error } => write!(f, "decode failed: {error}"),
            SkippedFrame::Shape { bid_len, ask_len } => {
                write!(f, "expected [amount, price] pairs, got bid len {bid_len} ask len {ask_len}")
            }
            SkippedFrame::InvalidNumber { field, value } => {
                write!(f, "invalid number for {field}: {value:?}")
            }
            SkippedFrame::CrossedMarket { ask_price, bid_price } => {
                write!(f, "crossed market: ask {ask_price} <= bid {bid_price}")
            }
        }
    }
}

/// Decode one text frame into an update.
pub fn decode_frame(text: &str) -> Result<OrderBookUpdate, SkippedFrame> {
    let message: WireMessage = serde_json::from_str(text).map_err(|err| SkippedFrame::Decode {
        error: err.to_string(),
    })?;
    update_from_message(&message)
}

/// Validate shape, parse numbers, reject crossed markets.
pub fn update_from_message(message: &WireMessage) -> Result<OrderBookUpdate, SkippedFrame> {
    let data = &message.data;
    if data.bid.len() < 2 || data.ask.len() < 2 {
        return Err(SkippedFrame::Shape {
            bid_len: data.bid.len(),
            ask_len: data.ask.len(),
        });
    }

    let ask_amount = parse_number("ask.amount", &data.ask[0])?;
    let ask_price = parse_number("ask.price", &data.ask[1])?;
    let bid_amount = parse_number("bid.amount", &data.bid[0])?;
    let bid_price = parse_number("bid.price", &data.bid[1])?;

    OrderBookUpdate::new(
        Order::new(ask_amount, ask_price),
        Order::new(bid_amount, bid_price),
    )
    .ok_or(SkippedFrame::CrossedMarket {
        ask_price,
        bid_price,
    })
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, SkippedFrame> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SkippedFrame::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Why the reader loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    Cancelled,
    /// No frame arrived before the read deadline
    IdleTimeout,
    /// Server closed the session or the stream ended
    Closed,
    TransportError,
    /// The update receiver was dropped
    ConsumerGone,
}

enum Flow {
    Continue,
    Stop(ReaderExit),
}

/// Receive loop over the session read half.
pub struct MessageReader {
    reader: SessionReader,
    writer: SessionWriter,
    idle_timeout: Duration,
    max_frame_size: usize,
    updates: mpsc::Sender<OrderBookUpdate>,
    skipped: mpsc::Sender<SkippedFrame>,
    shutdown: CancellationToken,
    skip_log_count: usize,
}

impl MessageReader {
    pub fn new(
        reader: SessionReader,
        writer: SessionWriter,
        idle_timeout: Duration,
        max_frame_size: usize,
        updates: mpsc::Sender<OrderBookUpdate>,
        skipped: mpsc::Sender<SkippedFrame>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            reader,
            writer,
            idle_timeout,
            max_frame_size,
            updates,
            skipped,
            shutdown,
            skip_log_count: 0,
        }
    }

    /// Run until the session ends. Dropping `self` at the end closes the update channel.
    pub async fn run(mut self) -> ReaderExit {
        // Any inbound frame, pongs included, pushes the deadline forward.
        let mut deadline = Instant::now() + self.idle_timeout;

        let exit = loop {
            let incoming = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("reader shutdown requested");
                    break ReaderExit::Cancelled;
                }
                incoming = timeout_at(deadline, self.reader.next()) => incoming,
            };

            let message = match incoming {
                Err(_) => {
                    warn!(idle_timeout = ?self.idle_timeout, "no frame before read deadline");
                    break ReaderExit::IdleTimeout;
                }
                Ok(None) => {
                    info!("market stream ended");
                    break ReaderExit::Closed;
                }
                // tokio-tungstenite ends the stream after any read error.
                Ok(Some(Err(err))) => {
                    warn!(error = %err, "market stream receive failed");
                    break ReaderExit::TransportError;
                }
                Ok(Some(Ok(message))) => message,
            };

            deadline = Instant::now() + self.idle_timeout;

            if let Flow::Stop(exit) = self.handle_message(message).await {
                break exit;
            }
        };

        self.shutdown.cancel();
        info!(?exit, "reader loop stopped");
        exit
    }

    async fn handle_message(&mut self, message: WsMessage) -> Flow {
        if let WsMessage::Text(_) | WsMessage::Binary(_) = &message {
            let bytes = message.len();
            if bytes > self.max_frame_size {
                self.report(SkippedFrame::Oversized {
                    bytes,
                    limit: self.max_frame_size,
                });
                return Flow::Continue;
            }
        }

        match message {
            WsMessage::Text(text) => self.handle_text(text.as_str()).await,
            WsMessage::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => self.handle_text(text).await,
                Err(err) => {
                    self.report(SkippedFrame::Decode {
                        error: err.to_string(),
                    });
                    Flow::Continue
                }
            },
            WsMessage::Pong(_) => {
                debug!("pong received");
                Flow::Continue
            }
            WsMessage::Close(frame) => {
                info!(?frame, "server closed market stream");
                Flow::Stop(ReaderExit::Closed)
            }
            _ => Flow::Continue,
        }
    }

    async fn handle_text(&mut self, text: &str) -> Flow {
        let message: WireMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(err) => {
                debug!(message = %truncate_for_log(text, RAW_LOG_MAX_BYTES), "undecodable frame");
                self.report(SkippedFrame::Decode {
                    error: err.to_string(),
                });
                return Flow::Continue;
            }
        };

        if message.is_heartbeat() {
            // Queued, never awaited: a stalled write must not hold up reads.
            if let Err(err) = self.writer.try_send_json(&SubscribeRequest::pong()) {
                warn!(error = %err, "heartbeat reply not queued");
            }
            return Flow::Continue;
        }

        match update_from_message(&message) {
            Ok(update) => self.emit(update).await,
            Err(skipped) => {
                self.report(skipped);
                Flow::Continue
            }
        }
    }

    async fn emit(&mut self, update: OrderBookUpdate) -> Flow {
        tokio::select! {
            _ = self.shutdown.cancelled() => Flow::Stop(ReaderExit::Cancelled),
            sent = self.updates.send(update) => match sent {
                Ok(()) => Flow::Continue,
                Err(_) => {
                    debug!("update receiver dropped");
                    Flow::Stop(ReaderExit::ConsumerGone)
                }
            },
        }
    }

    fn report(&mut self, skipped: SkippedFrame) {
        if skipped.is_error() && self.skip_log_count < SKIP_LOG_LIMIT {
            self.skip_log_count += 1;
            info!(
                sample_index = self.skip_log_count,
                sample_limit = SKIP_LOG_LIMIT,
                kind = skipped.kind(),
                reason = %skipped,
                "ws frame skipped"
            );
        } else {
            debug!(kind = skipped.kind(), reason = %skipped, "ws frame skipped");
        }

        // Never block the data path on diagnostics.
        let _ = self.skipped.try_send(skipped);
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
